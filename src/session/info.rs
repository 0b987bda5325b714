//! Application-facing snapshot of the lock.

use super::state::SessionState;
use crate::coordinator::AccessMode;
use serde::Serialize;

/// What the application shows about the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockInfo {
    /// Mode of this session. `Loading` and `Closed` report `ReadOnly`.
    pub mode: AccessMode,
    /// OS account running this process.
    pub current_user: String,
    /// Other holder, when this session is not the writer and knows who is.
    pub locked_by: Option<String>,
    /// Name this session writes into the record as holder.
    pub display_name: String,
}

impl LockInfo {
    pub(crate) fn new(state: &SessionState, current_user: &str, display_name: &str) -> Self {
        Self {
            mode: state.mode().unwrap_or(AccessMode::ReadOnly),
            current_user: current_user.to_string(),
            locked_by: state.locked_by().map(str::to_string),
            display_name: display_name.to_string(),
        }
    }

    /// Whether the application may write.
    pub fn can_write(&self) -> bool {
        self.mode == AccessMode::Edit
    }
}
