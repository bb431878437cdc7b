//! Server settings: TOML layers per deployment stage, overridden by the
//! environment. See [`loader`] for the precedence chain.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    RegistryConfig, ServerConfig, Settings, SourceBackend, SourceConfig, StoreBackend,
    StoreConfig,
};
