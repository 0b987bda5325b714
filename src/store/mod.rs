//! Durable storage of the lock record.
//!
//! The lock record is process-wide mutable state on a shared medium with no
//! in-process equivalent, so it sits behind the `LockStore` trait:
//! - `FileLockStore`: the real lock file in the shared folder
//! - `MemoryLockStore`: an in-memory fake with the same atomic contract, for
//!   deterministic simulation of cross-process races
//! - `TimedStore`: wraps any store and bounds every call with a timeout
//!
//! # Contract
//!
//! - `read`: `Ok(None)` when no record exists; `Err(CorruptLock)` when the
//!   backing data cannot be parsed
//! - `write`: atomic replace, never in-place mutation
//! - `create_if_absent`: single-step exclusive create; `Err(AlreadyExists)`
//!   when anything (even a corrupt record) occupies the slot
//! - `remove`: idempotent
//! - `quarantine`: re-reads the slot and moves it aside only if it still
//!   holds unparsable content; a valid record is left in place

mod file;
mod memory;
mod timed;


pub use file::FileLockStore;
pub use memory::MemoryLockStore;
pub use timed::TimedStore;

use crate::error::Result;
use crate::record::LockRecord;

/// What `quarantine` found, and what it moved out of the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quarantined {
    /// The slot was already empty.
    Nothing,
    /// An unparsable record was moved aside.
    Corrupt,
    /// The slot holds a valid record now; nothing was moved.
    Valid,
    /// A valid record replaced the corrupt one between the check and the
    /// move, and got moved aside. The caller should put it back.
    Record(LockRecord),
}

/// Atomic primitives over the single shared lock record.
pub trait LockStore: Send + Sync {
    /// Read the current record.
    fn read(&self) -> Result<Option<LockRecord>>;

    /// Atomically replace the current record (or create it).
    fn write(&self, record: &LockRecord) -> Result<()>;

    /// Create the record only if none exists.
    fn create_if_absent(&self, record: &LockRecord) -> Result<()>;

    /// Remove the record. Removing an absent record succeeds.
    fn remove(&self) -> Result<()>;

    /// Move unparsable contents aside so the slot is empty.
    fn quarantine(&self) -> Result<Quarantined>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}
