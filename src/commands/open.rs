//! Implementation of the `editlock open` command.
//!
//! Runs a full session against the folder: resolves the mode, asks about
//! takeover when the holder is a zombie, and holds the lock until Enter.

use editlock::{
    AccessMode, ClientSession, LockConfig, LockError, Result, SessionNotice, SessionState,
};
use std::io::{BufRead, Write};
use std::path::Path;

/// Execute the `editlock open` command.
pub fn cmd_open(dir: &Path, config: &LockConfig) -> Result<()> {
    let mut session = ClientSession::from_config(dir, config);
    if let Some(notices) = session.notices() {
        std::thread::spawn(move || {
            for notice in notices {
                if let Some(line) = notice_line(&notice) {
                    eprintln!("{}", line);
                }
            }
        });
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    let mut mode = session.start()?;
    if mode == AccessMode::Zombie {
        if let SessionState::Zombie {
            holder,
            last_heartbeat_at,
        } = session.state()
        {
            println!(
                "{} holds the lock but has not been seen since {}.",
                holder,
                last_heartbeat_at.to_rfc3339()
            );
        }
        let answer = prompt(&mut input, "Take over editing? [y/N] ")?;
        if is_yes(&answer) {
            if let Err(error) = session.confirm_takeover() {
                eprintln!("Takeover failed: {}", error);
            }
        } else {
            session.continue_read_only()?;
        }
        mode = session.mode().unwrap_or(AccessMode::ReadOnly);
    }

    let info = session.lock_info();
    match mode {
        AccessMode::Edit => {
            println!("Editing as {}.", info.display_name);
            prompt(&mut input, "Press Enter to close and release the lock.")?;
        }
        _ => match info.locked_by {
            Some(holder) => println!("Read-only: {} is editing.", holder),
            None => println!("Read-only: the lock could not be checked."),
        },
    }

    session.shutdown();
    Ok(())
}

fn prompt(input: &mut impl BufRead, message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .map_err(|e| LockError::Io(format!("failed to write prompt: {}", e)))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| LockError::Io(format!("failed to read from stdin: {}", e)))?;
    Ok(line)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Text for a notice, or `None` for mode changes the prompt already shows.
fn notice_line(notice: &SessionNotice) -> Option<String> {
    match notice {
        SessionNotice::ModeChanged {
            from: Some(AccessMode::Edit),
            to: Some(AccessMode::ReadOnly),
        } => Some("Now read-only: write access was withdrawn.".to_string()),
        SessionNotice::ModeChanged { .. } => None,
        SessionNotice::LockLost { holder: Some(holder) } => {
            Some(format!("Lock lost: {} took over editing.", holder))
        }
        SessionNotice::LockLost { holder: None } => {
            Some("Lock lost: the lock record disappeared.".to_string())
        }
        SessionNotice::HeartbeatFailed { error } => Some(format!("Heartbeat failed: {}", error)),
        SessionNotice::Degraded { error } => {
            Some(format!("Warning: lock check failed ({}).", error))
        }
    }
}
