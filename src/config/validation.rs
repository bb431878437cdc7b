//! Range and format checks run after the layers are merged

use crate::config::error::ConfigError;
use crate::config::settings::{
    ServerConfig, Settings, SourceBackend, SourceConfig, StoreBackend, StoreConfig,
};

const VALID_GIT_SCHEMES: &[&str] = &["https://", "http://", "ssh://", "git://", "file://"];

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "port 0 cannot be bound"));
        }

        let timeouts = [
            ("server.request_timeout", self.request_timeout),
            ("server.keep_alive_timeout", self.keep_alive_timeout),
        ];
        match timeouts.iter().find(|(_, secs)| *secs == 0) {
            Some((field, _)) => Err(ConfigError::validation(*field, "must be at least 1 second")),
            None => Ok(()),
        }
    }
}

impl SourceConfig {
    /// Git URIs may be scheme URLs, scp-like `user@host:path` or local paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::validation(
                "source.uri",
                "Source URI is required. Set source.uri or CONFIG_SOURCE_URI.",
            ));
        }

        if self.backend == SourceBackend::Git && !self.is_valid_git_uri() {
            return Err(ConfigError::ValidationError {
                field: "source.uri".to_string(),
                message: format!(
                    "Unsupported repository URI '{}'. Expected one of: {}, user@host:path or a local path",
                    self.uri,
                    VALID_GIT_SCHEMES.join(", ")
                ),
            });
        }

        if self.backend == SourceBackend::Git && self.basedir.trim().is_empty() {
            return Err(ConfigError::validation(
                "source.basedir",
                "A base directory is required for the git mirror.",
            ));
        }

        if self.default_label.trim().is_empty() {
            return Err(ConfigError::validation(
                "source.default_label",
                "Default label cannot be empty.",
            ));
        }

        if self.timeout == 0 {
            return Err(ConfigError::validation(
                "source.timeout",
                "Fetch timeout must be greater than 0 seconds.",
            ));
        }

        if self.search_paths.iter().any(|p| p.contains("..")) {
            return Err(ConfigError::validation(
                "source.search_paths",
                "Search paths cannot leave the repository root.",
            ));
        }

        Ok(())
    }

    fn is_valid_git_uri(&self) -> bool {
        let uri = self.uri.trim();
        if VALID_GIT_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
            return true;
        }
        // scp-like syntax: git@github.com:org/repo.git
        if let Some((host, path)) = uri.split_once(':')
            && host.contains('@')
            && !path.is_empty()
        {
            return true;
        }
        uri.starts_with('/') || uri.starts_with("./") || uri.starts_with("../")
    }
}

impl StoreConfig {
    /// A disabled store is never inspected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        match self.backend {
            StoreBackend::Memory if self.memory.max_labels == 0 => Err(ConfigError::validation(
                "store.memory.max_labels",
                "The memory store must keep at least one label.",
            )),
            StoreBackend::Disk if self.disk.directory.trim().is_empty() => {
                Err(ConfigError::validation(
                    "store.disk.directory",
                    "A directory is required for the disk store.",
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Settings {
    /// First failing section wins
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.source.validate()?;
        self.store.validate()?;

        // A fetch must give up early enough to fall back to the store
        if self.source.timeout >= self.server.request_timeout {
            return Err(ConfigError::ValidationError {
                field: "source.timeout".to_string(),
                message: format!(
                    "Fetch timeout ({}s) must be below server.request_timeout ({}s) so stored snapshots can still be served.",
                    self.source.timeout, self.server.request_timeout
                ),
            });
        }

        self.logger
            .validate()
            .map_err(|e| ConfigError::validation("logger".to_string(), e.to_string()))
    }
}
