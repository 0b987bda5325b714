//! CLI argument parsing for editlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Editlock: single-writer lock for a shared data folder.
///
/// One process edits; everyone else reads. A holder that stops heartbeating
/// for longer than the stale threshold can be taken over after confirmation.
#[derive(Parser, Debug)]
#[command(name = "editlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Shared data folder holding the lock file.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// YAML configuration file (defaults to editlock.yaml in the folder).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Display name to record as holder (defaults to the OS account name).
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Stay read-only when the lock cannot be checked.
    #[arg(long, global = true)]
    pub fail_closed: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show who holds the lock, without touching it.
    Status,

    /// Open the folder as a session.
    ///
    /// Takes the lock if it is free and heartbeats until Enter is pressed.
    /// A stale holder prompts for takeover.
    Open,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
