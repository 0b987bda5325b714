//! The per-process session state machine.

use super::heartbeat::{Beat, HeartbeatTask};
use super::info::LockInfo;
use super::state::{SessionNotice, SessionState, lock_shared, new_shared};
use crate::config::{FailurePolicy, LockConfig};
use crate::coordinator::{AccessMode, LockCoordinator};
use crate::error::{LockError, Result};
use crate::identity::{Requester, os_username, resolve_display_name};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// Session tuning taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Resolution of coordination checks that fail for infrastructure reasons.
    pub failure_policy: FailurePolicy,
    /// Time between heartbeats while in edit mode.
    pub heartbeat_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&LockConfig::default())
    }
}

impl From<&LockConfig> for SessionOptions {
    fn from(config: &LockConfig) -> Self {
        Self {
            failure_policy: config.failure_policy,
            heartbeat_interval: config.heartbeat_interval(),
        }
    }
}

/// One process's view of the shared lock.
///
/// Dropping the session stops the heartbeat and releases the lock
/// best-effort. Recovery from an abrupt exit is left to staleness.
pub struct ClientSession {
    beat: Beat,
    options: SessionOptions,
    current_user: String,
    heartbeat: Option<HeartbeatTask>,
    notices: Option<Receiver<SessionNotice>>,
}

impl ClientSession {
    /// Create a session in `Loading` for `requester`.
    pub fn new(coordinator: LockCoordinator, requester: Requester, options: SessionOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            beat: Beat {
                coordinator,
                requester,
                shared: new_shared(),
                notices: tx,
            },
            options,
            current_user: os_username(),
            heartbeat: None,
            notices: Some(rx),
        }
    }

    /// Session over the lock file in `shared_dir`, identified by the
    /// configured display name (or the OS account name).
    pub fn from_config<P: AsRef<Path>>(shared_dir: P, config: &LockConfig) -> Self {
        let coordinator = LockCoordinator::from_config(shared_dir, config);
        let requester = Requester::new(resolve_display_name(config.display_name_override()));
        Self::new(coordinator, requester, SessionOptions::from(config))
    }

    /// Take the notice receiver. Only the first call returns it.
    pub fn notices(&mut self) -> Option<Receiver<SessionNotice>> {
        self.notices.take()
    }

    /// This session's identity.
    pub fn requester(&self) -> &Requester {
        &self.beat.requester
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        lock_shared(&self.beat.shared).state.clone()
    }

    /// Current mode, if settled.
    pub fn mode(&self) -> Option<AccessMode> {
        lock_shared(&self.beat.shared).state.mode()
    }

    /// Whether local mutations are currently allowed.
    pub fn can_write(&self) -> bool {
        lock_shared(&self.beat.shared).state.is_edit()
    }

    /// The error behind the most recent degraded or downgraded state.
    pub fn last_error(&self) -> Option<LockError> {
        lock_shared(&self.beat.shared).last_error.clone()
    }

    /// Whether a heartbeat thread is currently running.
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.as_ref().is_some_and(HeartbeatTask::is_running)
    }

    /// Run a local mutation if, and only if, the session is in edit mode.
    ///
    /// The state cannot change while `mutate` runs, so a heartbeat
    /// downgrade lands either before (and the mutation is rejected) or after.
    /// The state lock is held for the whole call: `mutate` must not call
    /// back into the session (`can_write`, `state`, `lock_info`, ...) or it
    /// deadlocks.
    pub fn with_write_access<T>(&self, mutate: impl FnOnce() -> T) -> Result<T> {
        let shared = lock_shared(&self.beat.shared);
        if !shared.state.is_edit() {
            return Err(LockError::ReadOnly);
        }
        let out = mutate();
        drop(shared);
        Ok(out)
    }

    /// Resolve `Loading` with one status check.
    pub fn start(&mut self) -> Result<AccessMode> {
        let state = self.state();
        if state != SessionState::Loading {
            return Err(LockError::InvalidTransition {
                from: state.to_string(),
                action: "start",
            });
        }
        Ok(self.load())
    }

    /// Re-run the status check on explicit user request. This is the only
    /// way out of `ReadOnly` toward `Edit`.
    pub fn reload(&mut self) -> Result<AccessMode> {
        let state = self.state();
        if matches!(state, SessionState::Closed | SessionState::Loading) {
            return Err(LockError::InvalidTransition {
                from: state.to_string(),
                action: "reload",
            });
        }
        self.transition(SessionState::Loading, None);
        Ok(self.load())
    }

    /// Zombie exit one: take the lock over from the silent holder.
    ///
    /// On an infrastructure failure the failure policy picks the mode and the
    /// error is returned as well.
    pub fn confirm_takeover(&mut self) -> Result<()> {
        let state = self.state();
        if !matches!(state, SessionState::Zombie { .. }) {
            return Err(LockError::InvalidTransition {
                from: state.to_string(),
                action: "take over",
            });
        }

        match self.beat.coordinator.force_acquire(&self.beat.requester) {
            Ok(_) => {
                self.transition(SessionState::Edit { verified: true }, None);
                Ok(())
            }
            Err(error) => {
                self.resolve_failure(error.clone());
                Err(error)
            }
        }
    }

    /// `force_acquire_lock` contract: same as `confirm_takeover`.
    pub fn force_acquire_lock(&mut self) -> Result<()> {
        self.confirm_takeover()
    }

    /// Zombie exit two: stay read-only without contacting the store.
    pub fn continue_read_only(&mut self) -> Result<()> {
        match self.state() {
            SessionState::Zombie { holder, .. } => {
                self.transition(
                    SessionState::ReadOnly {
                        holder: Some(holder),
                    },
                    None,
                );
                Ok(())
            }
            other => Err(LockError::InvalidTransition {
                from: other.to_string(),
                action: "continue read-only",
            }),
        }
    }

    /// Heartbeat once, now. Outside edit mode this does nothing.
    ///
    /// Returns `LostLock` or the store error if the session had to downgrade.
    pub fn update_heartbeat(&mut self) -> Result<()> {
        let epoch = {
            let shared = lock_shared(&self.beat.shared);
            if !shared.state.is_edit() {
                return Ok(());
            }
            shared.epoch
        };

        let result = self.beat.run_once(epoch);
        if !result.keep_running {
            self.stop_heartbeat();
        }
        match result.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// The `get_lock_info` view for the application.
    pub fn lock_info(&self) -> LockInfo {
        LockInfo::new(
            &self.state(),
            &self.current_user,
            &self.beat.requester.holder,
        )
    }

    /// Stop the heartbeat and release the lock if this session holds it.
    /// Failures are logged, never raised. Safe to call more than once.
    ///
    /// The release is attempted in every mode: a create or write that timed
    /// out may still have landed, and `release` only ever removes this
    /// session's own record.
    pub fn shutdown(&mut self) {
        if self.state() == SessionState::Closed {
            return;
        }
        self.transition(SessionState::Closed, None);
        self.release_best_effort("shutdown");
    }

    fn load(&mut self) -> AccessMode {
        let next = match self.beat.coordinator.get_status(&self.beat.requester) {
            Ok(status) => match status.mode {
                AccessMode::Edit => SessionState::Edit { verified: true },
                AccessMode::ReadOnly => SessionState::ReadOnly {
                    holder: Some(status.holder),
                },
                AccessMode::Zombie => SessionState::Zombie {
                    holder: status.holder,
                    last_heartbeat_at: status.last_heartbeat_at,
                },
            },
            Err(LockError::Conflict { holder }) => SessionState::ReadOnly {
                holder: Some(holder),
            },
            Err(error) => return self.resolve_failure(error),
        };

        tracing::debug!(holder = %self.beat.requester.holder, state = %next, "status resolved");
        self.transition(next, None);
        self.mode().unwrap_or(AccessMode::ReadOnly)
    }

    /// Apply the failure policy to a check that could not complete.
    fn resolve_failure(&mut self, error: LockError) -> AccessMode {
        let next = if error.is_infrastructure() && self.options.failure_policy == FailurePolicy::FailOpen {
            tracing::warn!(%error, "lock check failed, continuing in edit mode (fail-open)");
            SessionState::Edit { verified: false }
        } else {
            tracing::warn!(%error, "lock check failed, continuing read-only");
            SessionState::ReadOnly { holder: None }
        };

        let read_only = !next.is_edit();
        self.transition(next, Some(error.clone()));
        if read_only && error.is_infrastructure() {
            // An abandoned create or force may have written our record.
            self.release_best_effort("failed lock check");
        }
        let _ = self.beat.notices.send(SessionNotice::Degraded { error });
        self.mode().unwrap_or(AccessMode::ReadOnly)
    }

    /// Move to `next`, stopping any heartbeat first and starting a new one
    /// when entering edit mode.
    fn transition(&mut self, next: SessionState, error: Option<LockError>) {
        let (from, epoch) = {
            let mut shared = lock_shared(&self.beat.shared);
            let from = std::mem::replace(&mut shared.state, next.clone());
            shared.epoch += 1;
            shared.last_error = error;
            (from, shared.epoch)
        };

        self.stop_heartbeat();

        if next.is_edit() {
            match HeartbeatTask::spawn(self.beat.clone(), self.options.heartbeat_interval, epoch) {
                Ok(task) => self.heartbeat = Some(task),
                Err(error) => {
                    tracing::warn!(%error, "cannot heartbeat, dropping to read-only");
                    self.transition(SessionState::ReadOnly { holder: None }, Some(error.clone()));
                    let _ = self
                        .beat
                        .notices
                        .send(SessionNotice::HeartbeatFailed { error });
                    return;
                }
            }
        }

        if from.mode() != next.mode() {
            let _ = self.beat.notices.send(SessionNotice::ModeChanged {
                from: from.mode(),
                to: next.mode(),
            });
        }
    }

    fn release_best_effort(&self, context: &'static str) {
        match self.beat.coordinator.release(&self.beat.requester) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(context, "nothing to release"),
            Err(error) => tracing::warn!(context, %error, "failed to release lock"),
        }
    }

    fn stop_heartbeat(&mut self) {
        if let Some(task) = self.heartbeat.take() {
            task.stop();
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
