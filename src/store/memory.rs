//! In-memory lock store for tests and simulations.
//!
//! Clones share one slot, so each clone can stand in for a separate process
//! looking at the same shared folder.

use super::{LockStore, Quarantined};
use crate::error::{LockError, Result};
use crate::record::LockRecord;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Empty,
    Record(LockRecord),
    Corrupt(String),
}

#[derive(Debug, Default)]
struct Shared {
    slot: Slot,
    unavailable: bool,
    delay: Option<Duration>,
    writes: usize,
}

/// A lock store held in memory, with fault injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record, bypassing fault injection.
    pub fn snapshot(&self) -> Option<LockRecord> {
        match &self.lock().slot {
            Slot::Record(record) => Some(record.clone()),
            _ => None,
        }
    }

    /// Whether the slot is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.lock().slot, Slot::Empty)
    }

    /// Place a record directly, as another process would.
    pub fn put(&self, record: LockRecord) {
        self.lock().slot = Slot::Record(record);
    }

    /// Replace the slot with unparsable content.
    pub fn corrupt(&self, content: impl Into<String>) {
        self.lock().slot = Slot::Corrupt(content.into());
    }

    /// Make every call fail with an I/O error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Delay every call by `delay`, simulating a slow network share.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Number of successful `write` and `create_if_absent` calls.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Apply injected faults, then hand back the guarded state.
    fn enter(&self, operation: &str) -> Result<MutexGuard<'_, Shared>> {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let guard = self.lock();
        if guard.unavailable {
            return Err(LockError::Io(format!(
                "memory store unavailable during {}",
                operation
            )));
        }
        Ok(guard)
    }
}

impl LockStore for MemoryLockStore {
    fn read(&self) -> Result<Option<LockRecord>> {
        match &self.enter("read")?.slot {
            Slot::Empty => Ok(None),
            Slot::Record(record) => Ok(Some(record.clone())),
            Slot::Corrupt(content) => LockRecord::from_json(content).map(Some),
        }
    }

    fn write(&self, record: &LockRecord) -> Result<()> {
        let mut shared = self.enter("write")?;
        shared.slot = Slot::Record(record.clone());
        shared.writes += 1;
        Ok(())
    }

    fn create_if_absent(&self, record: &LockRecord) -> Result<()> {
        let mut shared = self.enter("create")?;
        if !matches!(shared.slot, Slot::Empty) {
            return Err(LockError::AlreadyExists);
        }
        shared.slot = Slot::Record(record.clone());
        shared.writes += 1;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.enter("remove")?.slot = Slot::Empty;
        Ok(())
    }

    fn quarantine(&self) -> Result<Quarantined> {
        let mut shared = self.enter("quarantine")?;
        Ok(match &shared.slot {
            Slot::Empty => Quarantined::Nothing,
            Slot::Record(_) => Quarantined::Valid,
            Slot::Corrupt(_) => {
                shared.slot = Slot::Empty;
                Quarantined::Corrupt
            }
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
