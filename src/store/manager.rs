//! Store manager that dispatches to the configured backend.

use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::source::Snapshot;
use crate::store::disk::DiskStore;
use crate::store::memory::MemoryStore;
use crate::store::noop::NoOpStore;
use crate::store::{SnapshotStore, StoreError};

/// Name of the sled tree holding snapshots in the disk backend.
const DISK_STORE_NAME: &str = "snapshots";

/// Owns the configured snapshot backend. Cheap to clone; built once at
/// startup and handed to the fetcher through application state.
#[derive(Clone)]
pub struct StoreManager {
    backend: Arc<dyn SnapshotStore>,
    config: StoreConfig,
}

impl StoreManager {
    /// Create a store manager with the given configuration.
    ///
    /// If the store is disabled, a NoOpStore is used.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let backend: Arc<dyn SnapshotStore> = if !config.enabled {
            Arc::new(NoOpStore)
        } else {
            match config.backend {
                StoreBackend::Memory => Arc::new(MemoryStore::new(&config.memory)),
                StoreBackend::Disk => Arc::new(DiskStore::new(&config.disk, DISK_STORE_NAME)?),
            }
        };

        Ok(Self { backend, config })
    }

    /// Backend name for logs and health output.
    pub fn backend_name(&self) -> &'static str {
        if !self.config.enabled {
            return "disabled";
        }
        match self.config.backend {
            StoreBackend::Memory => "memory",
            StoreBackend::Disk => "disk",
        }
    }

    // ========================================================================
    // SnapshotStore proxy methods
    // ========================================================================

    pub async fn get(&self, label: &str) -> Result<Option<Arc<Snapshot>>, StoreError> {
        self.backend.get(label).await
    }

    pub async fn put(&self, snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        self.backend.put(snapshot).await
    }
}
