//! Command implementations for editlock.
//!
//! Resolves configuration from the global flags, then routes to the
//! command handler.

mod open;
mod status;

use crate::cli::{Cli, Command};
use editlock::config::types::DEFAULT_CONFIG_FILE;
use editlock::{FailurePolicy, LockConfig, Result};
use std::path::PathBuf;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(dir = %cli.dir.display(), ?config, "configuration resolved");

    match cli.command {
        Command::Status => status::cmd_status(&cli.dir, &config),
        Command::Open => open::cmd_open(&cli.dir, &config),
    }
}

/// Load the config file and apply command-line overrides on top.
///
/// An explicit `--config` must exist; the folder's `editlock.yaml` is
/// optional.
fn resolve_config(cli: &Cli) -> Result<LockConfig> {
    let mut config = match &cli.config {
        Some(path) => LockConfig::load(path)?,
        None => LockConfig::load_or_default(default_config_path(cli))?,
    };

    if let Some(name) = &cli.name {
        config.display_name = Some(name.clone());
    }
    if cli.fail_closed {
        config.failure_policy = FailurePolicy::FailClosed;
    }

    config.validate()?;
    Ok(config)
}

fn default_config_path(cli: &Cli) -> PathBuf {
    cli.dir.join(DEFAULT_CONFIG_FILE)
}
