//! Crash-recovery persistence for the meditation timer.
//!
//! The timer writes a [`PersistedTimerState`] under [`TIMER_STATE_KEY`]
//! whenever the in-memory state could be lost. At process start the snapshot
//! is read exactly once by [`take_recovery`] and then deleted, whatever it
//! contained. A caller that cannot resolve the offer right away writes it
//! back with [`MeditationTimer::hold_recovery`](super::MeditationTimer::hold_recovery).

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::elapsed::Stopwatch;
use super::engine::TimerMode;
use crate::error::Result;

/// Fixed key of the timer snapshot in the key-value store.
pub const TIMER_STATE_KEY: &str = "timer_state";

/// Upper bound for a recovered session: 24 hours.
pub const MAX_RECOVERY_MS: u64 = 24 * 60 * 60 * 1000;

/// Synchronous string key-value storage.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Durable snapshot of a timer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimerState {
    /// Epoch ms when the current run segment began.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Milliseconds from earlier run segments.
    pub accumulated_ms: u64,
    pub is_running: bool,
    /// Target duration; absent for open-ended sessions.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub mode: Option<TimerMode>,
}

impl PersistedTimerState {
    pub fn capture(
        stopwatch: &Stopwatch,
        duration_ms: Option<u64>,
        mode: Option<TimerMode>,
    ) -> Self {
        Self {
            start_time: stopwatch.start_epoch_ms(),
            accumulated_ms: stopwatch.accumulated_ms(),
            is_running: stopwatch.is_running(),
            duration_ms,
            mode,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Elapsed time implied by the snapshot at `now_ms`. May be negative
    /// when the clock moved backwards since the snapshot was written.
    pub fn implied_elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        let accumulated = i64::try_from(self.accumulated_ms).ok()?;
        if !self.is_running {
            return Some(accumulated);
        }
        let start = self.start_time?;
        Some(accumulated.saturating_add(now_ms.saturating_sub(start)))
    }
}

/// What the start-up check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryCheck {
    /// No snapshot was stored.
    Empty,
    /// Stored value could not be parsed.
    Corrupt,
    /// Snapshot belonged to a session that was stopped cleanly.
    NotRunning,
    /// Session was abandoned but the implied duration is implausible.
    OutOfBounds { elapsed_ms: i64 },
    /// Session was abandoned and can be offered back to the user.
    Recoverable {
        elapsed_ms: u64,
        state: PersistedTimerState,
    },
}

impl RecoveryCheck {
    pub fn recovered_ms(&self) -> Option<u64> {
        match self {
            RecoveryCheck::Recoverable { elapsed_ms, .. } => Some(*elapsed_ms),
            _ => None,
        }
    }
}

/// Read the stored snapshot once, classify it and delete it.
///
/// Store failures are logged and reported as [`RecoveryCheck::Empty`]; they
/// never prevent the timer from starting.
pub fn take_recovery<K: KvStore + ?Sized>(kv: &K, now_ms: i64, max_ms: u64) -> RecoveryCheck {
    let raw = match kv.get(TIMER_STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return RecoveryCheck::Empty,
        Err(e) => {
            warn!(error = %e, "failed to read persisted timer state");
            return RecoveryCheck::Empty;
        }
    };

    if let Err(e) = kv.remove(TIMER_STATE_KEY) {
        warn!(error = %e, "failed to clear persisted timer state");
    }

    let state = match PersistedTimerState::from_json(&raw) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "discarding unreadable timer state");
            return RecoveryCheck::Corrupt;
        }
    };

    if !state.is_running {
        return RecoveryCheck::NotRunning;
    }

    let Some(elapsed_ms) = state.implied_elapsed_ms(now_ms) else {
        warn!("discarding running timer state without a start time");
        return RecoveryCheck::Corrupt;
    };

    if elapsed_ms > 0 && elapsed_ms as u64 <= max_ms {
        info!(elapsed_ms, "found abandoned meditation session");
        RecoveryCheck::Recoverable {
            elapsed_ms: elapsed_ms as u64,
            state,
        }
    } else {
        info!(elapsed_ms, "abandoned session outside recovery bound, dropping");
        RecoveryCheck::OutOfBounds { elapsed_ms }
    }
}
