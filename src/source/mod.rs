//! Configuration sources.
//!
//! A source produces a [`Snapshot`] of every configuration file at a label.
//! [`SourceFetcher`] adds the timeout, single-flight and last-good fallback
//! behaviour on top of whichever backend is configured.

mod error;
mod fetcher;
mod git;
mod native;
mod snapshot;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{SourceBackend, SourceConfig};

pub use error::SourceError;
pub use fetcher::{FetchOutcome, Fetched, SourceFetcher, SourceHealth};
pub use git::GitSource;
pub use native::NativeSource;
pub use snapshot::{FileContents, SUPPORTED_EXTENSIONS, Snapshot, is_config_file};

/// Label escape for `/`, which cannot appear in a single URL path segment
pub const SLASH_ESCAPE: &str = "(_)";

/// Backend able to read all configuration files at a label
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Read the snapshot for `label` (branch, tag or commit)
    async fn fetch(&self, label: &str) -> Result<Snapshot, SourceError>;

    /// Where the source reads from, for logs and health output
    fn describe(&self) -> String;
}

/// Build the configured backend
pub fn build_source(config: &SourceConfig) -> Arc<dyn ConfigSource> {
    match config.backend {
        SourceBackend::Git => Arc::new(GitSource::new(config.uri.clone(), &config.basedir)),
        SourceBackend::Native => Arc::new(NativeSource::new(&config.uri)),
    }
}

/// Translate the `(_)` escape back to `/`
pub fn normalize_label(label: &str) -> String {
    label.replace(SLASH_ESCAPE, "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("feature(_)x"), "feature/x");
        assert_eq!(normalize_label("release(_)1.0(_)hotfix"), "release/1.0/hotfix");
        assert_eq!(normalize_label("main"), "main");
    }

    #[test]
    fn test_build_source_describes_uri() {
        let config = SourceConfig {
            backend: SourceBackend::Native,
            uri: "/srv/config".to_string(),
            ..SourceConfig::default()
        };
        assert_eq!(build_source(&config).describe(), "/srv/config");
    }
}
