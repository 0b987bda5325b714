//! Coordinator result types.

use crate::record::LockRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access mode a process is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// This process holds the lock and may write.
    Edit,
    /// Another live process holds the lock.
    ReadOnly,
    /// Another process holds the lock but stopped heartbeating.
    Zombie,
}

impl AccessMode {
    /// Get the wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Edit => "edit",
            AccessMode::ReadOnly => "readonly",
            AccessMode::Zombie => "zombie",
        }
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to `get_status`: the requester's mode plus the record behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    /// Mode granted to the requester.
    pub mode: AccessMode,

    /// Holder named in the record.
    pub holder: String,

    /// When the holder acquired the lock.
    pub acquired_at: DateTime<Utc>,

    /// The holder's last heartbeat.
    pub last_heartbeat_at: DateTime<Utc>,
}

impl LockStatus {
    pub(crate) fn from_record(mode: AccessMode, record: &LockRecord) -> Self {
        Self {
            mode,
            holder: record.holder.clone(),
            acquired_at: record.acquired_at,
            last_heartbeat_at: record.last_heartbeat_at,
        }
    }
}

/// Requester-independent state of the shared lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalLockState {
    /// No record exists.
    Unheld,
    /// Held, with a heartbeat inside the stale threshold.
    HeldFresh(LockRecord),
    /// Held, with no heartbeat for longer than the stale threshold.
    HeldStale(LockRecord),
    /// The backing data is unparsable; treated as unheld by acquirers.
    Corrupt(String),
}

impl GlobalLockState {
    /// Classify a record at time `now`. A pure function of its inputs.
    pub fn classify(record: Option<&LockRecord>, now: DateTime<Utc>, threshold: Duration) -> Self {
        match record {
            None => GlobalLockState::Unheld,
            Some(record) if record.is_stale(now, threshold) => {
                GlobalLockState::HeldStale(record.clone())
            }
            Some(record) => GlobalLockState::HeldFresh(record.clone()),
        }
    }

    /// The record, if the lock is held.
    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            GlobalLockState::HeldFresh(record) | GlobalLockState::HeldStale(record) => Some(record),
            GlobalLockState::Unheld | GlobalLockState::Corrupt(_) => None,
        }
    }

    /// Whether a new acquirer would find the slot free.
    pub fn is_unheld(&self) -> bool {
        matches!(self, GlobalLockState::Unheld | GlobalLockState::Corrupt(_))
    }
}
