//! Resolution error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No candidate file matched, so not even a default layer exists
    #[error("No configuration found for {application}/{profiles} at label '{label}'")]
    NotFound {
        application: String,
        profiles: String,
        label: String,
    },

    /// A candidate file could not be parsed
    #[error("Malformed configuration file {file}: {reason}")]
    Malformed { file: String, reason: String },
}
