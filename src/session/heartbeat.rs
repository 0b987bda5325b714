//! Periodic heartbeat bound to one `Edit` state.

use super::state::{SessionNotice, SessionState, SharedState, lock_shared};
use crate::coordinator::{AccessMode, LockCoordinator};
use crate::error::{LockError, Result};
use crate::identity::Requester;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Result of one heartbeat attempt.
pub(crate) struct BeatResult {
    /// False once the Edit state this beat belonged to is gone.
    pub(crate) keep_running: bool,
    pub(crate) error: Option<LockError>,
}

/// Everything a heartbeat needs, cloneable into the background thread.
#[derive(Clone)]
pub(crate) struct Beat {
    pub(crate) coordinator: LockCoordinator,
    pub(crate) requester: Requester,
    pub(crate) shared: SharedState,
    pub(crate) notices: Sender<SessionNotice>,
}

impl Beat {
    /// Renew the lock once on behalf of the Edit state started at `epoch`.
    ///
    /// A verified holder heartbeats; a fail-open session without a record
    /// tries to acquire one instead.
    pub(crate) fn run_once(&self, epoch: u64) -> BeatResult {
        let verified = {
            let shared = lock_shared(&self.shared);
            match shared.state {
                SessionState::Edit { verified } if shared.epoch == epoch => verified,
                _ => {
                    return BeatResult {
                        keep_running: false,
                        error: None,
                    };
                }
            }
        };

        if verified {
            match self.coordinator.heartbeat(&self.requester) {
                Ok(_) => BeatResult {
                    keep_running: true,
                    error: None,
                },
                Err(LockError::LostLock { holder }) => {
                    let error = LockError::LostLock {
                        holder: holder.clone(),
                    };
                    if self.downgrade(epoch, holder.clone(), error.clone()) {
                        self.notify(SessionNotice::LockLost { holder });
                    }
                    BeatResult {
                        keep_running: false,
                        error: Some(error),
                    }
                }
                Err(error) => {
                    tracing::warn!(holder = %self.requester.holder, %error, "heartbeat failed");
                    if self.downgrade(epoch, None, error.clone()) {
                        self.notify(SessionNotice::HeartbeatFailed {
                            error: error.clone(),
                        });
                    }
                    BeatResult {
                        keep_running: false,
                        error: Some(error),
                    }
                }
            }
        } else {
            self.establish(epoch)
        }
    }

    /// Fail-open edit without a record: try to take the lock for real.
    fn establish(&self, epoch: u64) -> BeatResult {
        match self.coordinator.acquire(&self.requester) {
            Ok(_) => {
                let mut shared = lock_shared(&self.shared);
                if shared.epoch == epoch
                    && let SessionState::Edit { verified } = &mut shared.state
                {
                    *verified = true;
                    shared.last_error = None;
                    tracing::info!(holder = %self.requester.holder, "lock established after degraded start");
                }
                BeatResult {
                    keep_running: true,
                    error: None,
                }
            }
            Err(LockError::Conflict { holder }) => {
                let error = LockError::LostLock {
                    holder: Some(holder.clone()),
                };
                if self.downgrade(epoch, Some(holder.clone()), error.clone()) {
                    self.notify(SessionNotice::LockLost {
                        holder: Some(holder),
                    });
                }
                BeatResult {
                    keep_running: false,
                    error: Some(error),
                }
            }
            Err(error) if error.is_infrastructure() => {
                tracing::debug!(%error, "store still unreachable, staying in degraded edit");
                BeatResult {
                    keep_running: true,
                    error: Some(error),
                }
            }
            Err(error) => {
                if self.downgrade(epoch, None, error.clone()) {
                    self.notify(SessionNotice::HeartbeatFailed {
                        error: error.clone(),
                    });
                }
                BeatResult {
                    keep_running: false,
                    error: Some(error),
                }
            }
        }
    }

    /// Switch the Edit state at `epoch` to ReadOnly. Write access is gone
    /// when this returns; the caller notifies afterwards.
    fn downgrade(&self, epoch: u64, holder: Option<String>, error: LockError) -> bool {
        {
            let mut shared = lock_shared(&self.shared);
            if shared.epoch != epoch || !shared.state.is_edit() {
                return false;
            }
            shared.state = SessionState::ReadOnly { holder };
            shared.epoch += 1;
            shared.last_error = Some(error);
        }
        self.notify(SessionNotice::ModeChanged {
            from: Some(AccessMode::Edit),
            to: Some(AccessMode::ReadOnly),
        });
        true
    }

    fn notify(&self, notice: SessionNotice) {
        // Nobody listening is fine.
        let _ = self.notices.send(notice);
    }
}

/// Handle to the background heartbeat thread.
pub(crate) struct HeartbeatTask {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl HeartbeatTask {
    /// Start beating every `interval` for the Edit state at `epoch`.
    pub(crate) fn spawn(beat: Beat, interval: Duration, epoch: u64) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let holder = beat.requester.holder.clone();

        let handle = thread::Builder::new()
            .name("editlock-heartbeat".to_string())
            .spawn(move || {
                tracing::debug!(%holder, epoch, "heartbeat started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !beat.run_once(epoch).keep_running {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!(%holder, epoch, "heartbeat stopped");
            })
            .map_err(|e| LockError::Io(format!("failed to start heartbeat thread: {}", e)))?;

        Ok(Self { stop, handle })
    }

    /// Stop the thread and wait for it to exit. A beat already in flight
    /// finishes first (bounded by the store timeout).
    pub(crate) fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::warn!("heartbeat thread panicked");
        }
    }

    /// Whether the thread is still running.
    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
