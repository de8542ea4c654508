//! Debounced auto-save.
//!
//! A time-driven state machine: the caller reports changes with
//! [`AutoSave::notify`], polls once per frame, and reports the outcome of
//! every attempt it started. Notifications inside the quiet window collapse
//! into one attempt at its end. Attempts are never cancelled; changes that
//! arrive while one is in flight open a fresh window when it completes.

use crate::storage::StoreError;
use serde::Serialize;

pub const DEFAULT_DEBOUNCE_MS: f64 = 2500.0;

/// Save indicator shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Nothing to save yet.
    #[default]
    Idle,
    /// Changes are waiting for the quiet window to end.
    Pending,
    Saving,
    Synced,
    Error,
    /// The host reports no connectivity; attempts wait.
    Offline,
}

#[derive(Debug, Clone)]
pub struct AutoSave {
    debounce_ms: f64,
    due_at: Option<f64>,
    in_flight: bool,
    dirty_during_flight: bool,
    offline: bool,
    status: SyncStatus,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl AutoSave {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            debounce_ms,
            due_at: None,
            in_flight: false,
            dirty_during_flight: false,
            offline: false,
            status: SyncStatus::Idle,
        }
    }

    pub fn status(&self) -> SyncStatus {
        if self.offline && !self.in_flight {
            SyncStatus::Offline
        } else {
            self.status
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// When the pending attempt becomes due.
    pub fn due_at(&self) -> Option<f64> {
        self.due_at
    }

    /// Report a change. Restarts the quiet window.
    pub fn notify(&mut self, now: f64) {
        if self.in_flight {
            self.dirty_during_flight = true;
            return;
        }
        self.due_at = Some(now + self.debounce_ms);
        self.status = SyncStatus::Pending;
        log::trace!("autosave: due at {}", now + self.debounce_ms);
    }

    /// Whether an attempt should start now. Starting is the caller's job;
    /// a `true` result marks the attempt in flight.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.in_flight || self.offline {
            return false;
        }
        match self.due_at {
            Some(due) if now >= due => {
                self.start();
                true
            }
            _ => false,
        }
    }

    /// Start an attempt immediately (explicit save). Returns false if one is
    /// already in flight; the change is then picked up after it completes.
    pub fn start_now(&mut self) -> bool {
        if self.in_flight {
            self.dirty_during_flight = true;
            return false;
        }
        self.start();
        true
    }

    fn start(&mut self) {
        self.due_at = None;
        self.in_flight = true;
        self.dirty_during_flight = false;
        self.status = SyncStatus::Saving;
        log::debug!("autosave: attempt started");
    }

    /// Report the outcome of the attempt in flight.
    ///
    /// Transient failures are retried after another quiet window; an expired
    /// authorization is not, it waits for the next change after sign-in.
    pub fn complete(&mut self, result: Result<(), &StoreError>, now: f64) {
        if !self.in_flight {
            log::warn!("autosave: completion without an attempt in flight");
            return;
        }
        self.in_flight = false;
        let retry = match result {
            Ok(()) => {
                self.status = SyncStatus::Synced;
                false
            }
            Err(err) => {
                log::error!("autosave: save failed: {err}");
                self.status = SyncStatus::Error;
                !matches!(err, StoreError::Unauthorized)
            }
        };
        if std::mem::take(&mut self.dirty_during_flight) || retry {
            self.due_at = Some(now + self.debounce_ms);
            if self.status == SyncStatus::Synced {
                self.status = SyncStatus::Pending;
            }
        }
    }

    /// More projects still wait for a write after an attempt: make the next
    /// attempt due at once instead of reporting synced.
    pub fn resume(&mut self, now: f64) {
        if self.in_flight {
            self.dirty_during_flight = true;
            return;
        }
        self.due_at = Some(now);
        self.status = SyncStatus::Pending;
        log::debug!("autosave: more work queued");
    }

    /// Host connectivity changed.
    pub fn set_offline(&mut self, offline: bool) {
        if self.offline != offline {
            log::debug!("autosave: offline = {offline}");
        }
        self.offline = offline;
    }
}
