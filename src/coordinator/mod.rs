//! Lock coordination over a shared lock store.
//!
//! The coordinator holds no state of its own beyond the store handle and a
//! clock: every answer is a function of the stored record and the current
//! time. There is no background cleanup. A stale record stays in place,
//! reported as a zombie, until a human confirms a takeover.
//!
//! # Global States
//!
//! - `Unheld`: no record
//! - `HeldFresh(holder)`: heartbeat within the stale threshold
//! - `HeldStale(holder)`: heartbeat older than the stale threshold
//!
//! Time moves a record from fresh to stale; `force_acquire` replaces any
//! record with a fresh one; `release` by the holder returns to unheld.
//!
//! # Clock Precondition
//!
//! Heartbeat timestamps are written by one machine and judged by another,
//! so participants must have reasonably synchronized clocks.

mod operations;
mod types;


pub use operations::LockCoordinator;
pub use types::{AccessMode, GlobalLockState, LockStatus};
