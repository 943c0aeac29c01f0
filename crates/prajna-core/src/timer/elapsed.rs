//! Elapsed-time accounting anchored on wall-clock timestamps.
//!
//! A [`Stopwatch`] never counts ticks. It remembers when the current run
//! segment began and how much time earlier segments contributed, so the
//! answer stays right no matter how long the process was suspended.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopwatch {
    /// Epoch ms at which the current run segment began.
    start_epoch_ms: Option<i64>,
    /// Milliseconds contributed by finished segments.
    accumulated_ms: u64,
}

impl Stopwatch {
    /// A stopwatch running since `now_ms` with nothing accumulated.
    pub fn started_at(now_ms: i64) -> Self {
        Self {
            start_epoch_ms: Some(now_ms),
            accumulated_ms: 0,
        }
    }

    /// A stopped stopwatch holding `accumulated_ms`.
    pub fn stopped(accumulated_ms: u64) -> Self {
        Self {
            start_epoch_ms: None,
            accumulated_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.start_epoch_ms.is_some()
    }

    pub fn start_epoch_ms(&self) -> Option<i64> {
        self.start_epoch_ms
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    /// Total running time at `now_ms`.
    ///
    /// A clock that stepped backwards contributes nothing for the current
    /// segment rather than a negative amount.
    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        match self.start_epoch_ms {
            Some(start) => self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(start).max(0) as u64),
            None => self.accumulated_ms,
        }
    }
}
