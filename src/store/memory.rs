//! Memory store implementation using cached::SizedCache.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cached::{Cached, SizedCache};

use crate::config::settings::MemoryStoreConfig;
use crate::source::Snapshot;
use crate::store::{SnapshotStore, StoreError};

/// In-process store bounded to `max_labels` entries, least recently used
/// labels evicted first.
pub struct MemoryStore {
    store: Mutex<SizedCache<String, Arc<Snapshot>>>,
}

impl MemoryStore {
    pub fn new(config: &MemoryStoreConfig) -> Self {
        Self {
            store: Mutex::new(SizedCache::with_size(config.max_labels.max(1))),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, label: &str) -> Result<Option<Arc<Snapshot>>, StoreError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        Ok(store.cache_get(label).cloned())
    }

    async fn put(&self, snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        store.cache_set(snapshot.label.clone(), snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot(label: &str) -> Arc<Snapshot> {
        Arc::new(Snapshot::new(label, None, BTreeMap::new()))
    }

    #[tokio::test]
    async fn test_put_get_replaces_by_label() {
        let store = MemoryStore::new(&MemoryStoreConfig::default());
        store.put(snapshot("main")).await.unwrap();

        let mut newer = Snapshot::new("main", Some("def".to_string()), BTreeMap::new());
        newer.files.insert("a.yml".to_string(), "a: 1".to_string());
        store.put(Arc::new(newer)).await.unwrap();

        let found = store.get("main").await.unwrap().unwrap();
        assert_eq!(found.version.as_deref(), Some("def"));
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recent_label() {
        let store = MemoryStore::new(&MemoryStoreConfig { max_labels: 2 });
        store.put(snapshot("a")).await.unwrap();
        store.put(snapshot("b")).await.unwrap();
        store.put(snapshot("c")).await.unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_some());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_read_refreshes_recency() {
        let store = MemoryStore::new(&MemoryStoreConfig { max_labels: 2 });
        store.put(snapshot("a")).await.unwrap();
        store.put(snapshot("b")).await.unwrap();
        assert!(store.get("a").await.unwrap().is_some());
        store.put(snapshot("c")).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
    }
}
