//! Logger settings, read straight from the `[logger]` table

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::error::LoggerError;

type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level name (`info`) or a filter directive (`confhub_rs=debug,tower_http=warn`)
    pub level: String,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<()> {
        self.filter()?;
        if !(self.console.enabled || self.file.enabled) {
            return Err(LoggerError::config("console and file output are both disabled"));
        }
        if self.file.enabled {
            self.file.validate()?;
        }
        Ok(())
    }

    pub fn filter(&self) -> Result<EnvFilter> {
        if self.level.trim().is_empty() {
            return Err(LoggerError::config("log level is empty"));
        }
        EnvFilter::try_new(self.level.trim())
            .map_err(|e| LoggerError::config(format!("bad log level '{}': {}", self.level, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// ANSI colors, only honored on a terminal
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// Keep existing content instead of truncating at startup
    pub append: bool,
    pub format: LogFormat,
    pub rotation: RotationConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/app.log"),
            append: true,
            format: LogFormat::Json,
            rotation: RotationConfig::default(),
        }
    }
}

impl FileConfig {
    /// Checks only the values; the writer creates missing directories.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LoggerError::config("file output is enabled without a path"));
        }
        self.rotation.validate()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Byte size at which the active file is rotated
    pub max_size: u64,
    /// Rotated files kept beside the active one
    pub max_files: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

impl RotationConfig {
    pub fn new(max_size: u64, max_files: usize) -> Result<Self> {
        let rotation = Self {
            max_size,
            max_files,
        };
        rotation.validate()?;
        Ok(rotation)
    }

    pub fn validate(&self) -> Result<()> {
        match (self.max_size, self.max_files) {
            (0, _) => Err(LoggerError::rotation("max_size must be at least one byte")),
            (_, 0) => Err(LoggerError::rotation("max_files must be at least 1")),
            _ => Ok(()),
        }
    }
}
