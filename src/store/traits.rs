//! SnapshotStore trait definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::source::Snapshot;
use crate::store::StoreError;

/// Label-keyed store of last-good snapshots.
///
/// All store backends implement this trait so the fetcher can fall back on
/// whichever one is configured.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Get the last stored snapshot for a label.
    async fn get(&self, label: &str) -> Result<Option<Arc<Snapshot>>, StoreError>;

    /// Store a snapshot, replacing any previous one for its label.
    async fn put(&self, snapshot: Arc<Snapshot>) -> Result<(), StoreError>;
}
