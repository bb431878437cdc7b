//! Snapshot fetching with last-good fallback.
//!
//! Wraps a [`ConfigSource`] with a fetch timeout, one in-flight fetch per
//! label and a [`StoreManager`] holding the last good snapshot per label.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use jiff::Timestamp;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::source::{ConfigSource, Snapshot, SourceError};
use crate::store::StoreManager;

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Snapshot>, SourceError>>>;

/// Labels come from request paths; past this many, new labels go untracked
const MAX_TRACKED_LABELS: usize = 1024;

/// A snapshot handed to the resolver
#[derive(Debug, Clone)]
pub struct Fetched {
    pub snapshot: Arc<Snapshot>,
    /// Served from the store because the remote failed
    pub stale: bool,
}

/// Outcome of a fetch, reported by the health endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchOutcome {
    /// Nothing fetched yet
    #[default]
    Pending,
    Ok,
    /// Remote failed, last-good snapshot served
    Stale,
    /// Remote failed with nothing to fall back on
    Failed,
}

/// Most recent fetch of one label
#[derive(Debug, Clone)]
struct FetchStatus {
    outcome: FetchOutcome,
    at: Timestamp,
    error: Option<String>,
}

/// Fetch outcomes folded across every tracked label.
///
/// `Failed` only when no tracked label can be served at all; a single label
/// failing next to healthy ones makes the source `Stale`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub outcome: FetchOutcome,
    pub ok: usize,
    /// Labels served from the store
    pub stale: Vec<String>,
    /// Labels with nothing to serve
    pub failed: Vec<String>,
    /// Error of the latest stale or failed fetch
    pub last_error: Option<String>,
}

pub struct SourceFetcher {
    source: Arc<dyn ConfigSource>,
    store: StoreManager,
    timeout: Duration,
    refresh_rate: u64,
    in_flight: DashMap<String, SharedFetch>,
    statuses: DashMap<String, FetchStatus>,
}

impl SourceFetcher {
    pub fn new(source: Arc<dyn ConfigSource>, store: StoreManager, config: &SourceConfig) -> Self {
        Self {
            source,
            store,
            timeout: Duration::from_secs(config.timeout),
            refresh_rate: config.refresh_rate,
            in_flight: DashMap::new(),
            statuses: DashMap::new(),
        }
    }

    pub fn store(&self) -> &StoreManager {
        &self.store
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    pub fn health(&self) -> SourceHealth {
        let mut health = SourceHealth::default();
        let mut latest: Option<Timestamp> = None;
        for entry in self.statuses.iter() {
            match entry.outcome {
                FetchOutcome::Ok => health.ok += 1,
                FetchOutcome::Stale => health.stale.push(entry.key().clone()),
                FetchOutcome::Failed => health.failed.push(entry.key().clone()),
                FetchOutcome::Pending => {}
            }
            if entry.error.is_some() && latest.is_none_or(|at| entry.at > at) {
                latest = Some(entry.at);
                health.last_error = entry.error.clone();
            }
        }
        health.stale.sort();
        health.failed.sort();

        health.outcome = match (health.ok, health.stale.len(), health.failed.len()) {
            (0, 0, 0) => FetchOutcome::Pending,
            (0, 0, _) => FetchOutcome::Failed,
            (_, 0, 0) => FetchOutcome::Ok,
            _ => FetchOutcome::Stale,
        };
        health
    }

    /// Fetch the snapshot for `label`.
    ///
    /// A failing remote falls back to the stored snapshot with `stale = true`.
    /// `LabelNotFound` is returned as is; a reachable remote that lacks the
    /// label is not a reason to serve old data.
    pub async fn fetch(&self, label: &str) -> Result<Fetched, SourceError> {
        if self.refresh_rate > 0
            && let Some(snapshot) = self.stored(label).await
            && snapshot.is_fresh(self.refresh_rate)
        {
            debug!(label = %label, "Serving stored snapshot within refresh interval");
            return Ok(Fetched {
                snapshot,
                stale: false,
            });
        }

        match self.fetch_shared(label).await {
            Ok(snapshot) => {
                self.record(label, FetchOutcome::Ok, None);
                Ok(Fetched {
                    snapshot,
                    stale: false,
                })
            }
            Err(err) if !err.allows_fallback() => {
                // The remote answered; it just has no such label
                self.statuses.remove(label);
                Err(err)
            }
            Err(err) => match self.stored(label).await {
                Some(snapshot) => {
                    warn!(
                        label = %label,
                        version = snapshot.version.as_deref().unwrap_or("-"),
                        error = %err,
                        "Configuration source failed, serving last good snapshot"
                    );
                    self.record(label, FetchOutcome::Stale, Some(err.to_string()));
                    Ok(Fetched {
                        snapshot,
                        stale: true,
                    })
                }
                None => {
                    warn!(label = %label, error = %err, "Configuration source failed with no stored snapshot");
                    self.record(label, FetchOutcome::Failed, Some(err.to_string()));
                    Err(SourceError::unavailable(label, err.to_string()))
                }
            },
        }
    }

    /// Join the in-flight fetch for `label`, starting one if there is none
    async fn fetch_shared(&self, label: &str) -> Result<Arc<Snapshot>, SourceError> {
        let fetch = match self.in_flight.entry(label.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let fetch = self.remote_fetch(label.to_string());
                entry.insert(fetch.clone());
                fetch
            }
        };

        let result = fetch.clone().await;
        self.in_flight
            .remove_if(label, |_, current| current.ptr_eq(&fetch));
        result
    }

    fn remote_fetch(&self, label: String) -> SharedFetch {
        let source = self.source.clone();
        let store = self.store.clone();
        let timeout = self.timeout;

        async move {
            let result = match tokio::time::timeout(timeout, source.fetch(&label)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    label: label.clone(),
                    seconds: timeout.as_secs(),
                }),
            };
            let snapshot = Arc::new(result?);

            info!(
                label = %label,
                version = snapshot.version.as_deref().unwrap_or("-"),
                files = snapshot.len(),
                "Fetched configuration snapshot"
            );
            if let Err(e) = store.put(snapshot.clone()).await {
                warn!(label = %label, error = %e, "Failed to store snapshot");
            }
            Ok(snapshot)
        }
        .boxed()
        .shared()
    }

    async fn stored(&self, label: &str) -> Option<Arc<Snapshot>> {
        match self.store.get(label).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(label = %label, error = %e, "Failed to read stored snapshot");
                None
            }
        }
    }

    fn record(&self, label: &str, outcome: FetchOutcome, error: Option<String>) {
        let status = FetchStatus {
            outcome,
            at: Timestamp::now(),
            error,
        };
        // len() locks every shard, so it must run before entry() takes one
        let tracked = self.statuses.len();
        match self.statuses.entry(label.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(status);
            }
            Entry::Vacant(entry) if tracked < MAX_TRACKED_LABELS => {
                entry.insert(status);
            }
            Entry::Vacant(_) => debug!(label = %label, "Fetch status not tracked, label limit reached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory source whose availability and contents tests can flip
    struct FakeSource {
        files: Mutex<BTreeMap<String, String>>,
        calls: AtomicUsize,
        failing: AtomicBool,
        delay: Duration,
    }

    impl FakeSource {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: Mutex::new(
                    files
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ConfigSource for FakeSource {
        async fn fetch(&self, label: &str) -> Result<Snapshot, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(SourceError::unavailable(label, "connection refused"));
            }
            if label == "missing" {
                return Err(SourceError::label_not_found(label));
            }
            let files = self.files.lock().unwrap().clone();
            Ok(Snapshot::new(label, Some(format!("v-{}", files.len())), files))
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    fn fetcher(source: Arc<FakeSource>, config: SourceConfig) -> SourceFetcher {
        let store = StoreManager::new(StoreConfig::default()).unwrap();
        SourceFetcher::new(source, store, &config)
    }

    #[tokio::test]
    async fn test_unreachable_without_cache_is_unavailable() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        source.set_failing(true);
        let fetcher = fetcher(source, SourceConfig::default());

        let err = fetcher.fetch("main").await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        let health = fetcher.health();
        assert_eq!(health.outcome, FetchOutcome::Failed);
        assert_eq!(health.failed, vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_after_success_serves_stale_snapshot() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        let fetcher = fetcher(source.clone(), SourceConfig::default());

        let fresh = fetcher.fetch("main").await.unwrap();
        assert!(!fresh.stale);

        source.set_failing(true);
        let stale = fetcher.fetch("main").await.unwrap();
        assert!(stale.stale);
        assert_eq!(stale.snapshot.as_ref(), fresh.snapshot.as_ref());
        let health = fetcher.health();
        assert_eq!(health.outcome, FetchOutcome::Stale);
        assert!(health.last_error.unwrap().contains("connection refused"));

        source.set_failing(false);
        assert!(!fetcher.fetch("main").await.unwrap().stale);
        let health = fetcher.health();
        assert_eq!(health.outcome, FetchOutcome::Ok);
        assert!(health.last_error.is_none());
    }

    #[tokio::test]
    async fn test_label_not_found_does_not_fall_back() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        let fetcher = fetcher(source, SourceConfig::default());

        let err = fetcher.fetch("missing").await.unwrap_err();
        assert_eq!(err, SourceError::label_not_found("missing"));
        assert!(!fetcher.statuses.contains_key("missing"));
        assert_eq!(fetcher.health().outcome, FetchOutcome::Pending);
    }

    #[tokio::test]
    async fn test_unknown_label_failing_does_not_fail_source() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        let fetcher = fetcher(source.clone(), SourceConfig::default());
        assert_eq!(fetcher.health().outcome, FetchOutcome::Pending);

        fetcher.fetch("main").await.unwrap();
        source.set_failing(true);
        assert!(fetcher.fetch("never-seen").await.is_err());

        let health = fetcher.health();
        assert_eq!(health.outcome, FetchOutcome::Stale);
        assert_eq!(health.ok, 1);
        assert_eq!(health.failed, vec!["never-seen".to_string()]);

        assert!(fetcher.fetch("main").await.unwrap().stale);
        let health = fetcher.health();
        assert_eq!(health.outcome, FetchOutcome::Stale);
        assert_eq!(health.ok, 0);
        assert_eq!(health.stale, vec!["main".to_string()]);

        source.set_failing(false);
        fetcher.fetch("never-seen").await.unwrap();
        fetcher.fetch("main").await.unwrap();
        assert_eq!(fetcher.health().outcome, FetchOutcome::Ok);
    }

    #[tokio::test]
    async fn test_tracked_labels_are_bounded() {
        let source = Arc::new(FakeSource::new(&[]));
        source.set_failing(true);
        let fetcher = fetcher(source, SourceConfig::default());

        for i in 0..MAX_TRACKED_LABELS + 10 {
            let _ = fetcher.fetch(&format!("label-{i}")).await;
        }
        assert_eq!(fetcher.statuses.len(), MAX_TRACKED_LABELS);
        assert!(fetcher.statuses.contains_key("label-0"));
        assert!(!fetcher.statuses.contains_key(&format!("label-{}", MAX_TRACKED_LABELS)));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_stored_snapshot() {
        let source = Arc::new(
            FakeSource::new(&[("application.yml", "a: 1")]).with_delay(Duration::from_millis(1500)),
        );
        let fetcher = fetcher(
            source,
            SourceConfig {
                timeout: 1,
                ..SourceConfig::default()
            },
        );

        let err = fetcher.fetch("main").await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));

        let snapshot = Arc::new(Snapshot::new("main", Some("old".to_string()), BTreeMap::new()));
        fetcher.store().put(snapshot).await.unwrap();

        let fetched = fetcher.fetch("main").await.unwrap();
        assert!(fetched.stale);
        assert_eq!(fetched.snapshot.version.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_call() {
        let source = Arc::new(
            FakeSource::new(&[("application.yml", "a: 1")]).with_delay(Duration::from_millis(200)),
        );
        let fetcher = Arc::new(fetcher(source.clone(), SourceConfig::default()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let fetcher = fetcher.clone();
                tokio::spawn(async move { fetcher.fetch("main").await })
            })
            .collect();
        for task in tasks {
            assert!(!task.await.unwrap().unwrap().stale);
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(fetcher.in_flight.is_empty());

        fetcher.fetch("main").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_different_labels_fetch_independently() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        let fetcher = fetcher(source.clone(), SourceConfig::default());

        let (a, b) = tokio::join!(fetcher.fetch("main"), fetcher.fetch("develop"));
        assert_eq!(a.unwrap().snapshot.label, "main");
        assert_eq!(b.unwrap().snapshot.label, "develop");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_rate_skips_remote() {
        let source = Arc::new(FakeSource::new(&[("application.yml", "a: 1")]));
        let fetcher = fetcher(
            source.clone(),
            SourceConfig {
                refresh_rate: 300,
                ..SourceConfig::default()
            },
        );

        fetcher.fetch("main").await.unwrap();
        fetcher.fetch("main").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
