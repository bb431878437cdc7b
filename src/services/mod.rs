//! Service layer.
//!
//! Services sit between the HTTP handlers and the source/resolver
//! machinery, turning domain errors into [`crate::error::AppError`].

mod environment_service;

pub use environment_service::EnvironmentService;

use std::sync::Arc;

use crate::config::SourceConfig;
use crate::resolver::ConfigResolver;
use crate::source::SourceFetcher;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since the fetcher is shared through an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub environments: EnvironmentService,
}

impl Services {
    /// Creates the services on top of a shared fetcher.
    pub fn new(fetcher: Arc<SourceFetcher>, config: &SourceConfig) -> Self {
        Self {
            environments: EnvironmentService::new(
                fetcher,
                ConfigResolver::from_config(config),
                config.default_label.clone(),
            ),
        }
    }
}
