//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Daemon management commands.
#[derive(Debug, Subcommand)]
pub enum DaemonCommand {
    /// Start recording (runs in the foreground; use a service manager or
    /// job control to run in the background)
    Start,

    /// Stop the running daemon
    Stop {
        /// Kill the daemon instead of asking it to shut down cleanly
        #[arg(short, long)]
        force: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Clip inspection and retention commands.
#[derive(Debug, Subcommand)]
pub enum ClipsCommand {
    /// List recorded clips, newest first
    List {
        /// Maximum number of clips to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Run the retention cleanup pass now
    Prune,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
