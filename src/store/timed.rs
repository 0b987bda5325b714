//! Bounded-time wrapper around a lock store.
//!
//! A network share can hang a read or write indefinitely. Each call runs on
//! a short-lived worker thread; if it has not answered within the timeout the
//! caller gets `LockError::Timeout` and the worker is abandoned. Its eventual
//! result is discarded, but its side effect (a late create or write) still
//! lands.
//!
//! An abandoned worker stays blocked for as long as the share hangs. One
//! leaks per timed-out call, so their number is bounded by how often callers
//! retry: one per heartbeat interval, plus explicit reloads.

use super::{LockStore, Quarantined};
use crate::error::{LockError, Result};
use crate::record::LockRecord;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// A store whose every call completes or fails within `timeout`.
#[derive(Clone)]
pub struct TimedStore {
    inner: Arc<dyn LockStore>,
    timeout: Duration,
}

impl TimedStore {
    /// Wrap `inner`, bounding each call by `timeout`.
    pub fn new(inner: Arc<dyn LockStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LockStore) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("editlock-{}", operation))
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(call(inner.as_ref()));
            })
            .map_err(|e| LockError::Io(format!("failed to start store worker: {}", e)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    store = %self.inner.describe(),
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "lock store call timed out"
                );
                Err(LockError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(LockError::Io(format!(
                "store worker for {} exited without a result",
                operation
            ))),
        }
    }
}

impl LockStore for TimedStore {
    fn read(&self) -> Result<Option<LockRecord>> {
        self.bounded("read", |store| store.read())
    }

    fn write(&self, record: &LockRecord) -> Result<()> {
        let record = record.clone();
        self.bounded("write", move |store| store.write(&record))
    }

    fn create_if_absent(&self, record: &LockRecord) -> Result<()> {
        let record = record.clone();
        self.bounded("create", move |store| store.create_if_absent(&record))
    }

    fn remove(&self) -> Result<()> {
        self.bounded("remove", |store| store.remove())
    }

    fn quarantine(&self) -> Result<Quarantined> {
        self.bounded("quarantine", |store| store.quarantine())
    }

    fn describe(&self) -> String {
        format!("{} (timeout {}s)", self.inner.describe(), self.timeout.as_secs_f64())
    }
}
