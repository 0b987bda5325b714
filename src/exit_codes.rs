//! Exit code constants for the editlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, rejected action)
//! - 4: Lock held by another process
//! - 5: Lock lost while holding it
//! - 6: Shared store unreachable or too slow

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or a rejected action.
pub const USER_ERROR: i32 = 1;

/// Lock conflict: another holder owns the lock.
pub const LOCK_CONFLICT: i32 = 4;

/// Lost lock: another process took over while this one held the lock.
pub const LOST_LOCK: i32 = 5;

/// Store failure: I/O error or timeout against the shared folder.
pub const IO_FAILURE: i32 = 6;
