//! CLI argument definitions for Weekbank.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::server::DEFAULT_PORT;

/// Weekbank - weekly work-unit tracking with banked-surplus carryover.
///
/// Start with `wb serve` to expose the HTTP API, or `wb show` to inspect
/// the current state.
#[derive(Parser, Debug)]
#[command(name = "wb")]
#[command(author, version, about = "Weekly work-unit tracker with banked-surplus carryover", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/weekbank/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: file, memory, or github.
    /// Can also be set via the WB_BACKEND environment variable.
    #[arg(short = 'b', long, global = true)]
    pub backend: Option<String>,

    /// Directory holding the state file (file backend only).
    /// Can also be set via the WB_DATA_DIR environment variable.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print the current snapshot (recalculated) as JSON
    Show,

    /// Recalculate the banking chain and persist the corrected snapshot
    Recalc,

    /// Print the active storage location
    Path,
}
