//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for lock coordination on one shared folder.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lock file name, relative to the shared folder.
    #[serde(default = "default_lock_file")]
    pub lock_file: String,

    /// Minutes without a heartbeat after which a held lock is a zombie.
    #[serde(default = "default_stale_threshold_minutes")]
    pub stale_threshold_minutes: u32,

    /// Seconds between heartbeats while holding the lock.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Upper bound, in seconds, on any single lock store call.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,

    /// Resolution of coordination checks that fail for infrastructure reasons.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Holder name override; defaults to the OS account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_file: default_lock_file(),
            stale_threshold_minutes: default_stale_threshold_minutes(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            io_timeout_secs: default_io_timeout_secs(),
            failure_policy: FailurePolicy::default(),
            display_name: None,
        }
    }
}
