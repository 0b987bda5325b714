//! The persisted lock record.
//!
//! One record per shared folder, stored as pretty-printed JSON so operators
//! can read it with any text editor:
//!
//! ```json
//! {
//!   "holder": "alice",
//!   "acquired_at": "2026-03-02T09:15:00Z",
//!   "last_heartbeat_at": "2026-03-02T10:02:00Z",
//!   "session_token": "5b0c6d0e-...",
//!   "host": "DESK-17",
//!   "pid": 4242
//! }
//! ```
//!
//! Records written by older builds (`user` / `locked_at` / `updated_at`, no
//! token) are still readable. Without a token they never match a requester,
//! so they can only be aged out or force-acquired.

use crate::error::{LockError, Result};
use crate::identity::{Requester, host_name};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lock record stored in the shared lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLockRecord")]
pub struct LockRecord {
    /// Display name of the current writer.
    pub holder: String,

    /// When the lock was acquired or force-acquired.
    pub acquired_at: DateTime<Utc>,

    /// Last heartbeat from the holder; drives staleness.
    pub last_heartbeat_at: DateTime<Utc>,

    /// Token of the session that owns the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Machine the holder runs on (diagnostic only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Process ID of the holder (diagnostic only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

#[derive(Deserialize)]
struct RawLockRecord {
    #[serde(alias = "user")]
    holder: String,
    #[serde(alias = "locked_at")]
    acquired_at: DateTime<Utc>,
    #[serde(default, alias = "updated_at")]
    last_heartbeat_at: Option<DateTime<Utc>>,
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    pid: Option<u32>,
}

impl TryFrom<RawLockRecord> for LockRecord {
    type Error = String;

    fn try_from(raw: RawLockRecord) -> std::result::Result<Self, Self::Error> {
        let last_heartbeat_at = raw.last_heartbeat_at.unwrap_or(raw.acquired_at);
        if last_heartbeat_at < raw.acquired_at {
            return Err(format!(
                "last_heartbeat_at {} precedes acquired_at {}",
                last_heartbeat_at.to_rfc3339(),
                raw.acquired_at.to_rfc3339()
            ));
        }
        if raw.holder.trim().is_empty() {
            return Err("holder is empty".to_string());
        }

        Ok(Self {
            holder: raw.holder,
            acquired_at: raw.acquired_at,
            last_heartbeat_at,
            session_token: raw.session_token.filter(|t| !t.is_empty()),
            host: raw.host,
            pid: raw.pid,
        })
    }
}

impl LockRecord {
    /// A fresh record naming `requester` as holder, acquired at `now`.
    pub fn new(requester: &Requester, now: DateTime<Utc>) -> Self {
        Self {
            holder: requester.holder.clone(),
            acquired_at: now,
            last_heartbeat_at: now,
            session_token: Some(requester.session_token.clone()),
            host: host_name(),
            pid: Some(std::process::id()),
        }
    }

    /// Parse a record from the lock file's contents.
    ///
    /// Anything unparsable is reported as `CorruptLock`, never a panic.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| LockError::CorruptLock {
            reason: e.to_string(),
        })
    }

    /// Serialize the record for the lock file.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LockError::Io(format!("failed to serialize lock record: {}", e)))
    }

    /// Whether this record belongs to `requester`'s session.
    pub fn is_held_by(&self, requester: &Requester) -> bool {
        self.session_token.as_deref() == Some(requester.session_token.as_str())
    }

    /// This record with its heartbeat moved to `now`.
    ///
    /// The heartbeat never moves behind `acquired_at`, even if `now` does.
    pub fn renewed(&self, now: DateTime<Utc>) -> Self {
        Self {
            last_heartbeat_at: now.max(self.acquired_at),
            ..self.clone()
        }
    }

    /// Time since the last heartbeat.
    pub fn heartbeat_age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_heartbeat_at)
    }

    /// Whether the holder has gone longer than `threshold` without a heartbeat.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.heartbeat_age(now) > threshold
    }

    /// Time since the last heartbeat as a human-readable string.
    pub fn age_string(&self, now: DateTime<Utc>) -> String {
        let age = self.heartbeat_age(now);
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes.max(0))
        }
    }
}
