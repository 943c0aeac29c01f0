use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerPhase};

/// Every timer state change produces an Event.
/// The CLI prints them; notifiers are driven from the same transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        duration_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerStopped {
        elapsed_ms: u64,
        mode: Option<TimerMode>,
        duration_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerDiscarded {
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the timer is now in overtime.
    CountdownCompleted {
        duration_ms: u64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    Backgrounded {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    Foregrounded {
        elapsed_ms: u64,
        display_ms: u64,
        at: DateTime<Utc>,
    },
    RecoveryAccepted {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    RecoveryDiscarded {
        recovered_elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        mode: Option<TimerMode>,
        elapsed_ms: u64,
        display_ms: u64,
        duration_ms: Option<u64>,
        is_running: bool,
        has_recovery_data: bool,
        recovered_elapsed_ms: u64,
        at: DateTime<Utc>,
    },
}
