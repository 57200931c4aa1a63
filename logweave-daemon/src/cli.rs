//! CLI argument definitions for logweave-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Logweave log processing daemon.
///
/// Runs every pipeline declared in the configuration file until
/// SIGTERM or SIGINT is received.
#[derive(Parser, Debug)]
#[command(name = "logweave-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logweave.toml configuration file.
    #[arg(short, long, default_value = "/etc/logweave/logweave.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut logweave_core::config::LogweaveConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
