//! Editlock CLI entry point.
//!
//! Parses arguments, installs logging, dispatches to the command handler,
//! and maps errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use editlock::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "EDITLOCK_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
