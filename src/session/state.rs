//! Session states and notices.

use crate::coordinator::AccessMode;
use crate::error::LockError;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where a session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the first status check.
    Loading,
    /// Holding the lock. `verified` is false when edit mode was granted by
    /// the fail-open policy without a record in the store.
    Edit { verified: bool },
    /// Not the holder. `holder` is unknown when the downgrade came from an
    /// error rather than from reading another holder's record.
    ReadOnly { holder: Option<String> },
    /// Another holder stopped heartbeating; waiting for the user to decide.
    Zombie {
        holder: String,
        last_heartbeat_at: DateTime<Utc>,
    },
    /// Shut down; the lock (if held) has been released.
    Closed,
}

impl SessionState {
    /// The access mode this state grants, if it is a settled mode.
    pub fn mode(&self) -> Option<AccessMode> {
        match self {
            SessionState::Edit { .. } => Some(AccessMode::Edit),
            SessionState::ReadOnly { .. } => Some(AccessMode::ReadOnly),
            SessionState::Zombie { .. } => Some(AccessMode::Zombie),
            SessionState::Loading | SessionState::Closed => None,
        }
    }

    /// Whether local mutations are allowed.
    pub fn is_edit(&self) -> bool {
        matches!(self, SessionState::Edit { .. })
    }

    /// The other holder named by this state, if any.
    pub fn locked_by(&self) -> Option<&str> {
        match self {
            SessionState::ReadOnly { holder } => holder.as_deref(),
            SessionState::Zombie { holder, .. } => Some(holder),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Edit { .. } => "edit",
            SessionState::ReadOnly { .. } => "read-only",
            SessionState::Zombie { .. } => "zombie",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the application should show the user. Sent only after the
/// corresponding state change has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The session moved between modes.
    ModeChanged {
        from: Option<AccessMode>,
        to: Option<AccessMode>,
    },
    /// Exclusivity was lost, to `holder` if known.
    LockLost { holder: Option<String> },
    /// A heartbeat could not reach the store; the session is read-only now.
    HeartbeatFailed { error: LockError },
    /// A coordination check failed and the failure policy chose the mode.
    Degraded { error: LockError },
}

/// State shared between the session and its heartbeat thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: SessionState,
    /// Bumped on every state change; a heartbeat thread only acts while the
    /// epoch it was started under is current.
    pub(crate) epoch: u64,
    pub(crate) last_error: Option<LockError>,
}

pub(crate) type SharedState = Arc<Mutex<Shared>>;

pub(crate) fn new_shared() -> SharedState {
    Arc::new(Mutex::new(Shared {
        state: SessionState::Loading,
        epoch: 0,
        last_error: None,
    }))
}

pub(crate) fn lock_shared(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|p| p.into_inner())
}
