//! Editlock: single-writer lock coordination for desktop processes that
//! share one data folder.
//!
//! Exactly one process at a time may write; every other process opens the
//! data read-only. The lock is a small JSON record in the shared folder,
//! mutated only through atomic create/replace/remove. A holder proves it is
//! alive by heartbeating; a holder silent for longer than the stale
//! threshold becomes a zombie that a human may take over.
//!
//! - [`store`] persists the record.
//! - [`coordinator`] computes modes and performs transitions.
//! - [`session`] drives one process's state machine and heartbeat.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod identity;
pub mod record;
pub mod session;
pub mod store;

pub use config::{FailurePolicy, LockConfig};
pub use coordinator::{AccessMode, GlobalLockState, LockCoordinator, LockStatus};
pub use error::{LockError, Result};
pub use identity::Requester;
pub use record::LockRecord;
pub use session::{ClientSession, LockInfo, SessionNotice, SessionOptions, SessionState};
