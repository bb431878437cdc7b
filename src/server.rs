//! HTTP server lifecycle: startup, registration and graceful shutdown.

use std::time::Duration;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::registry::ServiceInstance;
use crate::state::AppState;
use tokio::net::TcpListener;
use tokio::signal;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// # Errors
    /// - Snapshot store cannot be opened
    /// - Address binding fails
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = &self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            keep_alive_timeout = settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        tracing::info!(
            backend = settings.source.backend.as_str(),
            uri = %settings.source.uri,
            default_label = %settings.source.default_label,
            search_paths = ?settings.source.search_paths,
            timeout = settings.source.timeout,
            refresh_rate = settings.source.refresh_rate,
            "Source configuration loaded"
        );

        let state = AppState::new(settings)?;
        tracing::info!(
            store = state.fetcher.store().backend_name(),
            registry_enabled = state.registry.is_enabled(),
            "Application state created"
        );

        let router = create_router(
            state.clone(),
            Duration::from_secs(settings.server.request_timeout),
        );

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        let instance = ServiceInstance {
            name: settings.application.name.clone(),
            address: address.clone(),
        };
        state.registry.register(&instance).await;

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        state.registry.deregister(&instance).await;
        served?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed that branch never fires; the other one
/// still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
