//! Disk store implementation that survives restarts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cached::IOCached;
use cached::stores::DiskCache;
use tokio::sync::Mutex;

use crate::config::settings::DiskStoreConfig;
use crate::source::Snapshot;
use crate::store::{SnapshotStore, StoreError};

/// Snapshots never expire on their own; a newer fetch replaces them.
const RETENTION: Duration = Duration::from_secs(86400 * 365 * 10);

/// Persistent store keeping one JSON-encoded snapshot per label.
pub struct DiskStore {
    store: Mutex<DiskCache<String, Vec<u8>>>,
}

impl DiskStore {
    pub fn new(config: &DiskStoreConfig, store_name: &str) -> Result<Self, StoreError> {
        let store = DiskCache::new(store_name)
            .set_disk_directory(&config.directory)
            .set_lifespan(RETENTION)
            .build()
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }
}

#[async_trait]
impl SnapshotStore for DiskStore {
    async fn get(&self, label: &str) -> Result<Option<Arc<Snapshot>>, StoreError> {
        let key = label.to_string();
        let store = self.store.lock().await;

        let bytes = store
            .cache_get(&key)
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        match bytes {
            Some(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => Ok(Some(Arc::new(snapshot))),
                Err(e) => {
                    // Written by an incompatible build; treat as absent
                    tracing::warn!(label = %label, error = %e, "Discarding unreadable stored snapshot");
                    let _ = store.cache_remove(&key);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn put(&self, snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot.as_ref())?;
        let store = self.store.lock().await;
        store
            .cache_set(snapshot.label.clone(), bytes)
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        Ok(())
    }
}
