//! Typed view of the merged configuration
//!
//! Every table is optional; missing keys take the values from the
//! corresponding `Default` impl.

use serde::{Deserialize, Serialize};

use crate::logger::LoggerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub application: ApplicationConfig,
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub logger: LoggerConfig,
}

/// Name and version reported by health checks and registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "confhub-rs".to_string(),
            version: crate::pkg_version().to_string(),
        }
    }
}

/// HTTP listener; timeouts are in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
    pub keep_alive_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            request_timeout: 30,
            keep_alive_timeout: 75,
        }
    }
}

impl ServerConfig {
    /// `host:port` as passed to the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    /// Remote repository mirrored under `basedir`
    #[default]
    Git,
    /// Local directory read as-is; labels are ignored
    Native,
}

impl SourceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceBackend::Git => "git",
            SourceBackend::Native => "native",
        }
    }
}

/// Backing repository of the served configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub backend: SourceBackend,
    /// Clone URL for git, directory for native
    pub uri: String,
    /// Where the git mirror lives on disk
    pub basedir: String,
    /// Label for requests that omit one
    pub default_label: String,
    /// Subdirectories searched in addition to the root; `{application}` expands
    /// to the requested application
    pub search_paths: Vec<String>,
    /// Upper bound on one fetch, seconds
    pub timeout: u64,
    /// Seconds a stored snapshot is served before the remote is asked again;
    /// 0 asks on every request
    pub refresh_rate: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: SourceBackend::Git,
            uri: String::new(),
            basedir: "repos/config".to_string(),
            default_label: "main".to_string(),
            search_paths: Vec::new(),
            timeout: 10,
            refresh_rate: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Disk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// Distinct labels remembered before the oldest is evicted
    pub max_labels: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self { max_labels: 64 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskStoreConfig {
    pub directory: String,
}

impl Default for DiskStoreConfig {
    fn default() -> Self {
        Self {
            directory: "cache".to_string(),
        }
    }
}

/// Last-good snapshots served when the source fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    pub backend: StoreBackend,
    pub memory: MemoryStoreConfig,
    pub disk: DiskStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: StoreBackend::Memory,
            memory: MemoryStoreConfig::default(),
            disk: DiskStoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Register with the discovery client at startup
    pub enabled: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
