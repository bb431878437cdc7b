//! NoOp store implementation.
//!
//! Used when `store.enabled = false`; failed fetches then have nothing to fall back on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::source::Snapshot;
use crate::store::{SnapshotStore, StoreError};

#[derive(Debug, Default)]
pub struct NoOpStore;

#[async_trait]
impl SnapshotStore for NoOpStore {
    async fn get(&self, _label: &str) -> Result<Option<Arc<Snapshot>>, StoreError> {
        Ok(None)
    }

    async fn put(&self, _snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        Ok(())
    }
}
