//! Source fetch error types

use thiserror::Error;

/// Errors raised while fetching a snapshot.
///
/// Cloneable so one in-flight fetch can hand its outcome to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The remote could not be read and no last-good snapshot exists
    #[error("Configuration source unavailable for label '{label}': {reason}")]
    Unavailable { label: String, reason: String },

    /// The remote was reachable but does not know the label
    #[error("Label not found: {label}")]
    LabelNotFound { label: String },

    /// The fetch did not finish within the configured timeout
    #[error("Fetch of label '{label}' timed out after {seconds}s")]
    Timeout { label: String, seconds: u64 },
}

impl SourceError {
    pub fn unavailable(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn label_not_found(label: impl Into<String>) -> Self {
        Self::LabelNotFound {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Unavailable { label, .. }
            | Self::LabelNotFound { label }
            | Self::Timeout { label, .. } => label,
        }
    }

    /// Whether the last-good snapshot may stand in for this failure
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Self::LabelNotFound { .. })
    }
}
