//! CLI module for Sentinel
//!
//! Provides command-line interface parsing and handling for the
//! sentinel-server binary. Uses clap for argument parsing and owo-colors for
//! colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sentinel - OSINT research task server
///
/// Accepts investigation requests over HTTP, drives the search, scrape and
/// extract tools in the background, and serves progress to polling clients.
#[derive(Parser, Debug)]
#[command(
    name = "sentinel-server",
    version,
    about = "Sentinel - OSINT research task server",
    after_help = "EXAMPLES:\n    \
                  sentinel-server init              # Write a default sentinel.toml\n    \
                  sentinel-server check             # Probe the configured tool server\n    \
                  sentinel-server                   # Start the server (requires sentinel.toml)\n    \
                  sentinel-server --config my.toml  # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sentinel.toml", global = true, env = "SENTINEL_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Probe the tool server's health endpoint and exit
    Check,

    /// Write a default configuration file
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing sentinel.toml
        #[arg(short, long)]
        force: bool,

        /// Base URL of the tool server
        #[arg(long, default_value = "http://localhost:8000")]
        tools_url: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
