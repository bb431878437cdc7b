//! Command-line surface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Environment;

/// Configuration server backed by a Git repository
#[derive(Parser, Debug)]
#[command(name = "confhub-rs")]
#[command(about = "Configuration server backed by a Git repository")]
#[command(long_about = "
confhub-rs serves application configuration stored in a Git repository.
Clients request /{application}/{profile}/{label} and receive the matching
files as ordered property layers: application+profile, application,
profile, default.

EXAMPLES:
    # Start the server with configuration from ./config
    confhub-rs serve

    # Point at a repository without touching configuration files
    confhub-rs serve --source-uri https://git.example.com/config-repo.git

    # Use a single configuration file
    confhub-rs --config /etc/confhub/confhub.toml serve

    # Check configuration without starting the server
    confhub-rs serve --dry-run
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read this TOML file instead of the layered `config/` directory;
    /// environment overrides still apply
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (CONFHUB_APP_ENV)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (the default when no subcommand is given)
    Serve {
        /// Host address to bind to (default 127.0.0.1)
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on (default 8888)
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Repository URI (git) or directory (native) to serve from
        #[arg(long, value_name = "URI", value_parser = super::validation::validate_source_uri)]
        source_uri: Option<String>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
}

/// Values accepted by `--log-level`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// Whether the invocation only validates configuration
    pub fn is_dry_run(&self) -> bool {
        matches!(self.command, Some(Commands::Serve { dry_run: true, .. }))
    }
}
