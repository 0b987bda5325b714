//! Configuration types and defaults for editlock.

use serde::{Deserialize, Serialize};

/// How the session resolves a coordination check that could not complete
/// (store unreachable, I/O error, timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Enter edit mode anyway; availability over safety (default).
    #[default]
    FailOpen,
    /// Stay read-only and surface the error.
    FailClosed,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailOpen => write!(f, "fail_open"),
            FailurePolicy::FailClosed => write!(f, "fail_closed"),
        }
    }
}

/// File name used for the config when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "editlock.yaml";

// Default value functions for serde
pub(crate) fn default_lock_file() -> String {
    "app.lock".to_string()
}
pub(crate) fn default_stale_threshold_minutes() -> u32 {
    60
}
pub(crate) fn default_heartbeat_interval_secs() -> u64 {
    60
}
pub(crate) fn default_io_timeout_secs() -> u64 {
    10
}
