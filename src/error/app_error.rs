use thiserror::Error;

use crate::resolver::ResolveError;
use crate::source::SourceError;

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type returned by handlers.
///
/// Domain errors (`SourceError`, `ResolveError`, validator output) convert into
/// it; the HTTP mapping lives in `api::middleware::error_handler`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// The source is reachable but does not know the label
    #[error("Label not found: {label}")]
    LabelNotFound { label: String },

    /// Several field validation failures at once
    #[error("Validation failed for {} field(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Source failed and no last-good snapshot exists
    #[error("Configuration source unavailable for label '{label}'")]
    SourceUnavailable { label: String, reason: String },

    /// A configuration file in the source could not be parsed
    #[error("Malformed configuration file {file}: {reason}")]
    MalformedSource { file: String, reason: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<SourceError> for AppError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::LabelNotFound { label } => AppError::LabelNotFound { label },
            SourceError::Unavailable { label, reason } => {
                AppError::SourceUnavailable { label, reason }
            }
            SourceError::Timeout { label, seconds } => AppError::SourceUnavailable {
                label,
                reason: format!("timed out after {}s", seconds),
            },
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound {
                application,
                profiles,
                label,
            } => AppError::NotFound {
                entity: "configuration".to_string(),
                field: "application/profile/label".to_string(),
                value: format!("{}/{}/{}", application, profiles, label),
            },
            ResolveError::Malformed { file, reason } => AppError::MalformedSource { file, reason },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationFieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        // field_errors() is a HashMap; keep responses stable
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationErrors { errors: fields }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
