//! Implementation of the `editlock status` command.
//!
//! Reads and classifies the lock without ever writing to the folder.

use chrono::{DateTime, Duration, Utc};
use editlock::{GlobalLockState, LockConfig, LockCoordinator, Result};
use std::path::Path;

/// Execute the `editlock status` command.
pub fn cmd_status(dir: &Path, config: &LockConfig) -> Result<()> {
    let coordinator = LockCoordinator::from_config(dir, config);
    let state = coordinator.inspect()?;

    println!("Lock: {}", coordinator.describe_store());
    for line in describe(&state, coordinator.now(), coordinator.stale_threshold()) {
        println!("{}", line);
    }
    Ok(())
}

/// Human-readable lines for a classified lock state.
fn describe(state: &GlobalLockState, now: DateTime<Utc>, threshold: Duration) -> Vec<String> {
    match state {
        GlobalLockState::Unheld => vec!["  free: the next session to open gets edit access".to_string()],
        GlobalLockState::Corrupt(reason) => vec![
            format!("  corrupt: {}", reason),
            "  the next session to open replaces it".to_string(),
        ],
        GlobalLockState::HeldFresh(record) | GlobalLockState::HeldStale(record) => {
            let stale_marker = if matches!(state, GlobalLockState::HeldStale(_)) {
                format!(" [STALE > {}m, takeover allowed]", threshold.num_minutes())
            } else {
                String::new()
            };
            let mut lines = vec![
                format!("  held by {}{}", record.holder, stale_marker),
                format!("  acquired:       {}", record.acquired_at.to_rfc3339()),
                format!(
                    "  last heartbeat: {} ({} ago)",
                    record.last_heartbeat_at.to_rfc3339(),
                    record.age_string(now)
                ),
            ];
            if let Some(host) = &record.host {
                let pid = record.pid.map(|p| format!(", pid {}", p)).unwrap_or_default();
                lines.push(format!("  host:           {}{}", host, pid));
            }
            lines
        }
    }
}
