//! HTTP request handlers.

pub mod environment;
pub mod health;
