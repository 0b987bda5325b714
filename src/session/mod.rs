//! Per-process lock session.
//!
//! A `ClientSession` asks the coordinator for a mode once at startup and then
//! owns the consequences:
//!
//! ```text
//! Loading ──get_status──▶ Edit ◀──confirm_takeover── Zombie
//!                          │                           │
//!          lost lock / I/O │                           │ continue_read_only
//!                          ▼                           ▼
//!                       ReadOnly ◀─────────────────────┘
//!                          │
//!                          └──reload (user action)──▶ Loading
//! ```
//!
//! # Heartbeat
//!
//! Entering `Edit` starts exactly one background heartbeat thread; leaving
//! `Edit` stops and joins it before the transition returns. If a heartbeat
//! finds the lock taken over, or the store fails, the thread downgrades the
//! session to `ReadOnly` first and only then emits a notice.
//!
//! # Failure Policy
//!
//! When a coordination check cannot complete (I/O error, timeout), the
//! configured `FailurePolicy` decides the mode: `FailOpen` enters `Edit`
//! without a verified record, `FailClosed` stays `ReadOnly`. The same rule
//! applies at startup, on reload, and on takeover.

mod client;
mod heartbeat;
mod info;
mod state;


pub use client::{ClientSession, SessionOptions};
pub use info::LockInfo;
pub use state::{SessionNotice, SessionState};
