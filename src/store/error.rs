//! Snapshot store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot store operation failed: {0}")]
    Operation(String),

    #[error("Snapshot store could not be opened: {0}")]
    Open(String),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
