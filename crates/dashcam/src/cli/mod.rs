//! Command-line interface for dashcam.
//!
//! This module provides the CLI structure and command definitions for the
//! `dashcam` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ClipsCommand, ConfigCommand, DaemonCommand, StatusCommand};

/// dashcam - Rolling clip recorder with GPS-tagged filenames
///
/// Records continuous fixed-duration video clips, embeds the latest GPS
/// position in each filename, and deletes the oldest clips once a retention
/// threshold is exceeded.
#[derive(Debug, Parser)]
#[command(name = "dashcam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the recording daemon
    #[command(subcommand)]
    Daemon(DaemonCommand),

    /// Show daemon and clip store status
    Status(StatusCommand),

    /// Inspect recorded clips and run retention
    #[command(subcommand)]
    Clips(ClipsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
