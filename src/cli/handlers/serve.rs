//! Serve command handler

use crate::config::settings::Settings;
use crate::server::Server;
use crate::store::StoreManager;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server, or with `dry_run` only check that it could start.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()
        } else {
            Server::new(self.config).run().await
        }
    }

    /// Validate configuration and the snapshot store without binding a socket
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;
        let store = StoreManager::new(self.config.store.clone())?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Source: {} {} (default label '{}')",
            self.config.source.backend.as_str(),
            self.config.source.uri,
            self.config.source.default_label
        );
        println!("✓ Snapshot store: {}", store.backend_name());
        println!(
            "✓ Service registry: {}",
            if self.config.registry.enabled { "enabled" } else { "disabled" }
        );
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
