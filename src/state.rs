//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::{SourceConfig, settings::Settings};
use crate::registry::Registry;
use crate::services::Services;
use crate::source::{SourceFetcher, build_source};
use crate::store::StoreManager;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap; everything behind it is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Source fetcher, also read by the health endpoints
    pub fetcher: Arc<SourceFetcher>,
    /// Service-registry lifecycle
    pub registry: Registry,
    /// Reported by the health endpoints
    pub version: String,
}

impl AppState {
    /// Builds the source, snapshot store and services from settings.
    ///
    /// # Errors
    /// Fails when the snapshot store cannot be opened.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let store = StoreManager::new(settings.store.clone())?;
        let source = build_source(&settings.source);
        let fetcher = Arc::new(SourceFetcher::new(source, store, &settings.source));
        let registry = Registry::from_config(&settings.registry);

        Ok(Self::from_parts(
            fetcher,
            registry,
            &settings.source,
            settings.application.version.clone(),
        ))
    }

    /// Assembles state around an existing fetcher and registry.
    pub fn from_parts(
        fetcher: Arc<SourceFetcher>,
        registry: Registry,
        source: &SourceConfig,
        version: String,
    ) -> Self {
        Self {
            services: Services::new(fetcher.clone(), source),
            fetcher,
            registry,
            version,
        }
    }
}
