//! confhub-rs
//!
//! Configuration server: fetches configuration files from a Git repository
//! by label and serves them as ordered application/profile/default layers.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod services;
pub mod source;
pub mod state;
pub mod store;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
