//! Error types for lock coordination.
//!
//! Uses thiserror for derive macros. Every variant is recoverable: the
//! session state machine folds each one into a displayed mode, and the CLI
//! maps them to exit codes.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for lock coordination operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Another live (or stale, unconfirmed) holder owns the lock.
    #[error("lock is held by {holder}")]
    Conflict { holder: String },

    /// The stored record no longer names this session.
    #[error("lock was lost{}", .holder.as_deref().map(|h| format!(" to {h}")).unwrap_or_default())]
    LostLock { holder: Option<String> },

    /// The shared store could not be read or written.
    #[error("lock store I/O failed: {0}")]
    Io(String),

    /// A store call did not complete within the configured bound.
    #[error("lock store {operation} timed out after {}s", .after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The backing file exists but does not hold a valid record.
    #[error("lock record is corrupt: {reason}")]
    CorruptLock { reason: String },

    /// Exclusive create found an existing record.
    #[error("lock record already exists")]
    AlreadyExists,

    /// A local mutation was attempted while the session is not in edit mode.
    #[error("session is read-only; mutation rejected")]
    ReadOnly,

    /// A session action was requested from a state that does not allow it.
    #[error("cannot {action} while session is {from}")]
    InvalidTransition { from: String, action: &'static str },

    /// Configuration could not be loaded or failed validation.
    #[error("{0}")]
    Config(String),
}

impl LockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::Conflict { .. } | LockError::AlreadyExists => exit_codes::LOCK_CONFLICT,
            LockError::LostLock { .. } => exit_codes::LOST_LOCK,
            LockError::Io(_) | LockError::Timeout { .. } => exit_codes::IO_FAILURE,
            LockError::CorruptLock { .. }
            | LockError::ReadOnly
            | LockError::InvalidTransition { .. }
            | LockError::Config(_) => exit_codes::USER_ERROR,
        }
    }

    /// True for failures of the storage medium itself (unreachable or slow),
    /// the class resolved through the session failure policy.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, LockError::Io(_) | LockError::Timeout { .. })
    }
}

/// Result type alias for lock coordination operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_has_lock_exit_code() {
        let err = LockError::Conflict {
            holder: "alice".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_CONFLICT);
        assert_eq!(err.to_string(), "lock is held by alice");
    }

    #[test]
    fn io_and_timeout_are_infrastructure() {
        assert!(LockError::Io("disk gone".to_string()).is_infrastructure());
        assert!(
            LockError::Timeout {
                operation: "read",
                after: Duration::from_secs(10),
            }
            .is_infrastructure()
        );
        assert!(!LockError::LostLock { holder: None }.is_infrastructure());
        assert!(
            !LockError::CorruptLock {
                reason: "eof".to_string()
            }
            .is_infrastructure()
        );
    }

    #[test]
    fn lost_lock_message_names_new_holder() {
        let err = LockError::LostLock {
            holder: Some("bob".to_string()),
        };
        assert_eq!(err.to_string(), "lock was lost to bob");
        assert_eq!(LockError::LostLock { holder: None }.to_string(), "lock was lost");
        assert_eq!(err.exit_code(), exit_codes::LOST_LOCK);
    }

    #[test]
    fn timeout_message_includes_operation() {
        let err = LockError::Timeout {
            operation: "write",
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "lock store write timed out after 1.5s");
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
    }
}
