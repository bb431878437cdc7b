use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Deployment stage the server runs in; picks the `config/<stage>.toml` overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    Test,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "CONFHUB_APP_ENV";

    /// Stage named by `CONFHUB_APP_ENV`, falling back to development on absence or garbage
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(raw) => raw.parse().unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Overlay file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    // Shares the alias table with the `--env` flag.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(raw.trim(), true).map_err(|_| {
            let known: Vec<&str> = Self::value_variants().iter().map(Self::as_str).collect();
            ConfigError::EnvVarError(format!(
                "unknown environment '{}', expected one of: {}",
                raw,
                known.join(", ")
            ))
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
