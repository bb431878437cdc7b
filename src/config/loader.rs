//! Layered settings loading
//!
//! Lowest to highest precedence:
//! `default.toml` < `{environment}.toml` < `local.toml` < `CONFHUB_*` variables
//! < `CONFIG_SOURCE_URI` / `SERVICE_REGISTRY_ENABLED`.
//! In single-file mode the file replaces the three TOML layers.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

type Builder = ConfigBuilder<DefaultState>;

const CONFIG_DIR_ENV: &str = "CONFHUB_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "CONFHUB_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "CONFHUB";

/// Unprefixed variable naming the backing repository
pub const SOURCE_URI_ENV: &str = "CONFIG_SOURCE_URI";

/// Unprefixed variable toggling service registration
pub const REGISTRY_ENABLED_ENV: &str = "SERVICE_REGISTRY_ENABLED";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    Directory(PathBuf),
    SingleFile(PathBuf),
}

#[derive(Debug)]
pub struct ConfigLoader {
    layout: Layout,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Loader driven by `CONFHUB_CONFIG_DIR`, `CONFHUB_CONFIG_FILE` and
    /// `CONFHUB_APP_ENV`. The first two exclude each other.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = std::env::var(CONFIG_DIR_ENV).ok();
        let file = std::env::var(CONFIG_FILE_ENV).ok();

        let layout = match (dir, file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(format!(
                    "{} and {} are mutually exclusive; pick a directory of layers or one file",
                    CONFIG_DIR_ENV, CONFIG_FILE_ENV
                )));
            }
            (_, Some(file)) => Layout::SingleFile(file.into()),
            (Some(dir), None) => Layout::Directory(dir.into()),
            (None, None) => Layout::Directory(DEFAULT_CONFIG_DIR.into()),
        };

        Ok(Self {
            layout,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Single-file loader; environment overrides still apply on top
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            layout: Layout::SingleFile(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge every layer but leave validation to the caller, which may still
    /// apply command-line overrides.
    pub fn load_unvalidated(&self) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        builder = match &self.layout {
            Layout::SingleFile(path) => toml_layer(builder, path, true)?,
            Layout::Directory(dir) => {
                let stage = format!("{}.toml", self.environment);
                let builder = toml_layer(builder, &dir.join("default.toml"), true)?;
                let builder = toml_layer(builder, &dir.join(stage), false)?;
                toml_layer(builder, &dir.join("local.toml"), false)?
            }
        };

        // CONFHUB_SERVER__PORT -> server.port
        // CONFHUB_SOURCE__SEARCH_PATHS="{application},shared" -> source.search_paths
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("source.search_paths"),
        );
        builder = deployment_overrides(builder)?;

        builder
            .build()?
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(format!("cannot map settings: {}", e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or(Self {
            layout: Layout::Directory(DEFAULT_CONFIG_DIR.into()),
            environment: AppEnvironment::default(),
        })
    }
}

fn toml_layer(builder: Builder, path: &Path, required: bool) -> Result<Builder, ConfigError> {
    if required && !path.is_file() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }
    let name = path.to_string_lossy();
    Ok(builder.add_source(File::new(&name, FileFormat::Toml).required(required)))
}

// Deployment tooling sets these without the CONFHUB_ prefix.
fn deployment_overrides(builder: Builder) -> Result<Builder, ConfigError> {
    let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

    let registry_enabled = non_empty(REGISTRY_ENABLED_ENV)
        .map(|raw| parse_flag(REGISTRY_ENABLED_ENV, &raw))
        .transpose()?;

    Ok(builder
        .set_override_option("source.uri", non_empty(SOURCE_URI_ENV))?
        .set_override_option("registry.enabled", registry_enabled)?)
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarError(format!(
            "{}={} is not a boolean",
            name, raw
        ))),
    }
}
