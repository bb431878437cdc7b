//! Data Transfer Objects for API responses.
//!
//! Configuration bundles are serialized straight from
//! [`crate::resolver::ConfigBundle`]; only error and health shapes live here.

mod error;
mod health;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
