//! Resolves configuration bundles for clients.

use std::sync::Arc;

use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::resolver::{ConfigBundle, ConfigRequest, ConfigResolver};
use crate::source::SourceFetcher;

/// Fetch-then-resolve for one [`ConfigRequest`].
#[derive(Clone)]
pub struct EnvironmentService {
    fetcher: Arc<SourceFetcher>,
    resolver: ConfigResolver,
    default_label: String,
}

impl EnvironmentService {
    pub fn new(fetcher: Arc<SourceFetcher>, resolver: ConfigResolver, default_label: String) -> Self {
        Self {
            fetcher,
            resolver,
            default_label,
        }
    }

    /// Finds the bundle for `request`.
    ///
    /// The request is expected to be validated already. A missing label falls
    /// back to the configured default.
    ///
    /// # Errors
    /// - `LabelNotFound` if the source does not know the label
    /// - `SourceUnavailable` if the source failed and nothing is stored
    /// - `NotFound` if no candidate file matched
    /// - `MalformedSource` if a candidate file could not be parsed
    /// - `Internal` if the parsing task died
    pub async fn find(&self, request: &ConfigRequest) -> AppResult<ConfigBundle> {
        let label = request.label_or(&self.default_label);
        let fetched = self.fetcher.fetch(&label).await?;

        if fetched.stale {
            warn!(
                application = %request.application,
                label = %label,
                version = ?fetched.snapshot.version,
                "Serving configuration from last-good snapshot"
            );
        }

        // Parsing large YAML or JSON files is CPU-bound
        let resolver = self.resolver.clone();
        let request = request.clone();
        let bundle = tokio::task::spawn_blocking(move || resolver.resolve(&request, &label, &fetched))
            .await
            .map_err(|e| AppError::Internal { source: e.into() })??;
        Ok(bundle)
    }
}
