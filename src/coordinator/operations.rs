//! Status, acquire, heartbeat, force-acquire, and release.

use super::types::{AccessMode, GlobalLockState, LockStatus};
use crate::clock::{Clock, SystemClock};
use crate::config::LockConfig;
use crate::error::{LockError, Result};
use crate::identity::Requester;
use crate::record::LockRecord;
use crate::store::{FileLockStore, LockStore, Quarantined, TimedStore};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;

/// Rounds of read → create → re-read before giving up on a contended slot.
const MAX_CLAIM_ATTEMPTS: usize = 3;

/// Outcome of trying to occupy the slot.
enum Claim {
    /// The requester's record was created just now.
    Created(LockRecord),
    /// A record was already present.
    Existing(LockRecord),
}

/// Computes access modes and performs lock transitions against a store.
#[derive(Clone)]
pub struct LockCoordinator {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    stale_threshold: Duration,
}

impl LockCoordinator {
    /// Create a coordinator over `store`, judging staleness with `clock`.
    pub fn new(store: Arc<dyn LockStore>, clock: Arc<dyn Clock>, stale_threshold: Duration) -> Self {
        Self {
            store,
            clock,
            stale_threshold,
        }
    }

    /// Coordinator for the lock file in `shared_dir`, with every store call
    /// bounded by the configured I/O timeout.
    pub fn from_config<P: AsRef<Path>>(shared_dir: P, config: &LockConfig) -> Self {
        let file = FileLockStore::new(config.lock_path(shared_dir));
        let store = TimedStore::new(Arc::new(file), config.io_timeout());
        Self::new(
            Arc::new(store),
            Arc::new(SystemClock),
            config.stale_threshold(),
        )
    }

    /// The staleness threshold.
    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Current time according to the coordinator's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Where the lock lives, for logs and display.
    pub fn describe_store(&self) -> String {
        self.store.describe()
    }

    /// Determine `requester`'s access mode, taking the lock if it is free.
    ///
    /// - No record: create one for the requester → `Edit`. If another
    ///   process wins the create, its record is judged instead.
    /// - Record with the requester's token → `Edit` (re-entry).
    /// - Foreign record, heartbeat within the threshold → `ReadOnly`.
    /// - Foreign record, heartbeat older than the threshold → `Zombie`.
    ///   Nothing is released automatically.
    pub fn get_status(&self, requester: &Requester) -> Result<LockStatus> {
        match self.claim(requester)? {
            Claim::Created(record) => Ok(LockStatus::from_record(AccessMode::Edit, &record)),
            Claim::Existing(record) => Ok(self.status_for(&record, requester)),
        }
    }

    /// Take the lock if no one holds it.
    ///
    /// Returns the requester's record (new, or existing on re-entry) or
    /// `Conflict` naming the current holder, stale or not.
    pub fn acquire(&self, requester: &Requester) -> Result<LockRecord> {
        match self.claim(requester)? {
            Claim::Created(record) => Ok(record),
            Claim::Existing(record) if record.is_held_by(requester) => Ok(record),
            Claim::Existing(record) => Err(LockError::Conflict {
                holder: record.holder,
            }),
        }
    }

    /// Renew the requester's heartbeat.
    ///
    /// Fails with `LostLock` if the stored record no longer carries the
    /// requester's token (taken over, removed, or replaced by garbage).
    pub fn heartbeat(&self, requester: &Requester) -> Result<LockRecord> {
        let current = match self.store.read() {
            Ok(current) => current,
            Err(LockError::CorruptLock { reason }) => {
                tracing::warn!(holder = %requester.holder, %reason, "lock record corrupt at heartbeat");
                None
            }
            Err(e) => return Err(e),
        };

        match current {
            Some(record) if record.is_held_by(requester) => {
                let renewed = record.renewed(self.clock.now());
                self.store.write(&renewed)?;
                tracing::debug!(holder = %requester.holder, "heartbeat renewed");
                Ok(renewed)
            }
            Some(record) => {
                tracing::warn!(
                    holder = %requester.holder,
                    new_holder = %record.holder,
                    "lock taken over by another session"
                );
                Err(LockError::LostLock {
                    holder: Some(record.holder),
                })
            }
            None => {
                tracing::warn!(holder = %requester.holder, "lock record disappeared");
                Err(LockError::LostLock { holder: None })
            }
        }
    }

    /// Unconditionally install a fresh record naming the requester.
    ///
    /// Concurrent force-acquires race at the store; the last write wins.
    pub fn force_acquire(&self, requester: &Requester) -> Result<LockRecord> {
        let record = LockRecord::new(requester, self.clock.now());
        self.store.write(&record)?;
        tracing::info!(holder = %requester.holder, store = %self.store.describe(), "lock force-acquired");
        Ok(record)
    }

    /// Remove the record if it belongs to the requester.
    ///
    /// Returns whether anything was removed; a foreign or missing record is
    /// left untouched.
    pub fn release(&self, requester: &Requester) -> Result<bool> {
        let current = match self.store.read() {
            Ok(current) => current,
            Err(LockError::CorruptLock { .. }) => None,
            Err(e) => return Err(e),
        };

        match current {
            Some(record) if record.is_held_by(requester) => {
                self.store.remove()?;
                tracing::info!(holder = %requester.holder, "lock released");
                Ok(true)
            }
            _ => {
                tracing::debug!(holder = %requester.holder, "release skipped, not the holder");
                Ok(false)
            }
        }
    }

    /// Read and classify the lock without ever writing.
    pub fn inspect(&self) -> Result<GlobalLockState> {
        match self.store.read() {
            Ok(record) => Ok(GlobalLockState::classify(
                record.as_ref(),
                self.clock.now(),
                self.stale_threshold,
            )),
            Err(LockError::CorruptLock { reason }) => Ok(GlobalLockState::Corrupt(reason)),
            Err(e) => Err(e),
        }
    }

    fn status_for(&self, record: &LockRecord, requester: &Requester) -> LockStatus {
        let mode = if record.is_held_by(requester) {
            AccessMode::Edit
        } else if record.is_stale(self.clock.now(), self.stale_threshold) {
            AccessMode::Zombie
        } else {
            AccessMode::ReadOnly
        };
        LockStatus::from_record(mode, record)
    }

    /// Occupy the slot for `requester` if it is free, otherwise report what
    /// is there. Corrupt records count as free.
    fn claim(&self, requester: &Requester) -> Result<Claim> {
        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            match self.store.read() {
                Ok(Some(record)) => return Ok(Claim::Existing(record)),
                Ok(None) => {
                    let record = LockRecord::new(requester, self.clock.now());
                    match self.store.create_if_absent(&record) {
                        Ok(()) => {
                            tracing::info!(
                                holder = %requester.holder,
                                store = %self.store.describe(),
                                "lock acquired"
                            );
                            return Ok(Claim::Created(record));
                        }
                        Err(LockError::AlreadyExists) => {
                            tracing::debug!(attempt, "lost create race, re-reading lock");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(LockError::CorruptLock { reason }) => {
                    tracing::warn!(
                        store = %self.store.describe(),
                        %reason,
                        "lock record is corrupt, treating as unheld"
                    );
                    self.clear_corrupt()?;
                }
                Err(e) => return Err(e),
            }
        }

        // The slot kept flipping between absent and occupied.
        match self.store.read() {
            Ok(Some(record)) => Ok(Claim::Existing(record)),
            Ok(None) | Err(LockError::CorruptLock { .. }) => Err(LockError::Conflict {
                holder: "another process".to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Move a corrupt record out of the slot. The store re-checks the slot
    /// first, so a record that has since become valid stays where it is.
    ///
    /// If a valid record was moved anyway (replaced in the instant between
    /// check and move) it is put back. Failing that, whoever filled the slot
    /// in between is reported as the holder.
    fn clear_corrupt(&self) -> Result<()> {
        let record = match self.store.quarantine()? {
            Quarantined::Nothing | Quarantined::Corrupt | Quarantined::Valid => return Ok(()),
            Quarantined::Record(record) => record,
        };

        match self.store.create_if_absent(&record) {
            Ok(()) => {
                tracing::debug!(holder = %record.holder, "restored record moved aside by mistake");
                Ok(())
            }
            Err(LockError::AlreadyExists) => {
                let current = match self.store.read() {
                    Ok(Some(current)) => current.holder,
                    _ => "another process".to_string(),
                };
                tracing::warn!(
                    displaced = %record.holder,
                    %current,
                    store = %self.store.describe(),
                    "could not restore lock record moved aside, slot was taken"
                );
                Err(LockError::Conflict { holder: current })
            }
            Err(e) => {
                tracing::warn!(
                    displaced = %record.holder,
                    error = %e,
                    "could not restore lock record moved aside"
                );
                Err(e)
            }
        }
    }
}
