mod clock;
mod elapsed;
mod engine;
mod lifecycle;
mod recovery;

pub use clock::{Clock, ManualClock, SystemClock};
pub use elapsed::Stopwatch;
pub use engine::{display_ms_for, MeditationTimer, TimerMode, TimerOptions, TimerPhase};
pub use lifecycle::{AppLifecycle, DisplayTicker, DEFAULT_TICK_INTERVAL};
pub use recovery::{
    take_recovery, KvStore, MemoryKv, PersistedTimerState, RecoveryCheck, MAX_RECOVERY_MS,
    TIMER_STATE_KEY,
};
