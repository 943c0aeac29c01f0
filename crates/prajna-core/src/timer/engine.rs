//! Meditation timer state machine.
//!
//! The timer is wall-clock based: elapsed time is always derived from the
//! run-segment anchor, and `tick()` only refreshes what is displayed. The
//! caller drives `tick()` once per [`MeditationTimer::tick_interval`] while
//! the ticker is active.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running(open-ended | countdown -> overtime) -> Stopped
//!   ^                      |                               |
//!   +------- discard / reset ------------------------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = MeditationTimer::open(&db, Arc::new(SystemClock), TimerOptions::default());
//! timer.start(Some(20 * 60 * 1000));
//! // Once per second:
//! if let Some(Event::CountdownCompleted { .. }) = timer.tick() { /* ring */ }
//! timer.stop();
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::Clock;
use super::elapsed::Stopwatch;
use super::lifecycle::{AppLifecycle, DisplayTicker, DEFAULT_TICK_INTERVAL};
use super::recovery::{
    take_recovery, KvStore, PersistedTimerState, RecoveryCheck, MAX_RECOVERY_MS, TIMER_STATE_KEY,
};
use crate::events::Event;
use crate::notify::{format_hms, isolate, subtitle_for, NoopNotifier, TimerNotifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    /// No target; shows elapsed time.
    OpenEnded,
    /// Target set and not reached; shows remaining time.
    Countdown,
    /// Target reached; shows time past the target.
    Overtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    /// Finalized, waiting for the caller to save it.
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct TimerOptions {
    /// Longest abandoned session that is still offered back.
    pub max_recovery_ms: u64,
    pub tick_interval: Duration,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            max_recovery_ms: MAX_RECOVERY_MS,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Value shown to the user for a given mode, target and elapsed time.
pub fn display_ms_for(mode: Option<TimerMode>, duration_ms: Option<u64>, elapsed_ms: u64) -> u64 {
    match (mode, duration_ms) {
        (Some(TimerMode::Countdown), Some(target)) => target.saturating_sub(elapsed_ms),
        (Some(TimerMode::Overtime), Some(target)) => elapsed_ms.saturating_sub(target),
        _ => elapsed_ms,
    }
}

/// Single-session meditation timer with crash-recovery persistence.
pub struct MeditationTimer<K: KvStore> {
    kv: K,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn TimerNotifier>,
    stopwatch: Stopwatch,
    duration_ms: Option<u64>,
    mode: Option<TimerMode>,
    phase: TimerPhase,
    /// Highest elapsed value handed out so far.
    observed_elapsed_ms: u64,
    lifecycle: AppLifecycle,
    ticker: DisplayTicker,
    startup_check: RecoveryCheck,
    recovered_elapsed_ms: Option<u64>,
    /// Snapshot behind the pending offer, kept for [`Self::hold_recovery`].
    recovered_state: Option<PersistedTimerState>,
}

impl<K: KvStore> MeditationTimer<K> {
    /// Create the timer for this process.
    ///
    /// This is the one place the persisted snapshot is read. An abandoned
    /// running session within bounds becomes a pending recovery offer; the
    /// snapshot is erased either way.
    pub fn open(kv: K, clock: Arc<dyn Clock>, options: TimerOptions) -> Self {
        let startup_check = take_recovery(&kv, clock.now_ms(), options.max_recovery_ms);
        let recovered_elapsed_ms = startup_check.recovered_ms();
        let recovered_state = match &startup_check {
            RecoveryCheck::Recoverable { state, .. } => Some(state.clone()),
            _ => None,
        };
        Self {
            kv,
            clock,
            notifier: Box::new(NoopNotifier),
            stopwatch: Stopwatch::default(),
            duration_ms: None,
            mode: None,
            phase: TimerPhase::Idle,
            observed_elapsed_ms: 0,
            lifecycle: AppLifecycle::Foreground,
            ticker: DisplayTicker::new(options.tick_interval),
            startup_check,
            recovered_elapsed_ms,
            recovered_state,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn TimerNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.mode
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn lifecycle(&self) -> AppLifecycle {
        self.lifecycle
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Whether the display refresh should currently be scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_at(self.clock.now_ms())
    }

    pub fn display_ms(&self) -> u64 {
        display_ms_for(self.mode, self.duration_ms, self.elapsed_ms())
    }

    pub fn has_recovery_data(&self) -> bool {
        self.recovered_elapsed_ms.is_some()
    }

    pub fn recovered_elapsed_ms(&self) -> u64 {
        self.recovered_elapsed_ms.unwrap_or(0)
    }

    /// What the start-up recovery check found.
    pub fn startup_check(&self) -> &RecoveryCheck {
        &self.startup_check
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let now = self.clock.now_ms();
        let elapsed_ms = self.elapsed_at(now);
        Event::StateSnapshot {
            phase: self.phase,
            mode: self.mode,
            elapsed_ms,
            display_ms: display_ms_for(self.mode, self.duration_ms, elapsed_ms),
            duration_ms: self.duration_ms,
            is_running: self.is_running(),
            has_recovery_data: self.has_recovery_data(),
            recovered_elapsed_ms: self.recovered_elapsed_ms(),
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. With a target the timer counts down, otherwise it
    /// is open-ended. Ignored while a session is already running.
    pub fn start(&mut self, target_ms: Option<u64>) -> Option<Event> {
        if self.is_running() {
            warn!("start ignored: a session is already running");
            return None;
        }

        let now = self.clock.now_ms();
        let mode = if target_ms.is_some() {
            TimerMode::Countdown
        } else {
            TimerMode::OpenEnded
        };

        self.stopwatch = Stopwatch::started_at(now);
        self.observed_elapsed_ms = 0;
        self.duration_ms = target_ms;
        self.mode = Some(mode);
        self.phase = TimerPhase::Running;
        self.sync_ticker();
        self.persist();

        if let Some(target) = target_ms {
            isolate(
                "schedule_alarm",
                self.notifier.schedule_alarm(Duration::from_millis(target)),
            );
        }

        debug!(?mode, duration_ms = ?target_ms, "timer started");
        Some(Event::TimerStarted {
            mode,
            duration_ms: target_ms,
            at: self.clock.now_utc(),
        })
    }

    /// Finalize the running session. The caller saves the duration.
    pub fn stop(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }

        let now = self.clock.now_ms();
        let elapsed_ms = self.observe(now);
        // The session is ending, so a crossing here does not ring.
        self.advance_mode(elapsed_ms);

        self.stopwatch = Stopwatch::stopped(elapsed_ms);
        self.phase = TimerPhase::Stopped;
        self.sync_ticker();
        self.persist();
        isolate("dismiss", self.notifier.dismiss());

        debug!(elapsed_ms, mode = ?self.mode, "timer stopped");
        Some(Event::TimerStopped {
            elapsed_ms,
            mode: self.mode,
            duration_ms: self.duration_ms,
            at: self.clock.now_utc(),
        })
    }

    /// Drop the session, running or not, along with its snapshot.
    pub fn discard(&mut self) -> Option<Event> {
        self.clear_session();
        debug!("timer discarded");
        Some(Event::TimerDiscarded {
            at: self.clock.now_utc(),
        })
    }

    /// Return to idle after the stopped session has been handled.
    pub fn reset(&mut self) -> Option<Event> {
        self.clear_session();
        debug!("timer reset");
        Some(Event::TimerReset {
            at: self.clock.now_utc(),
        })
    }

    /// Call periodically while [`is_ticking`](Self::is_ticking).
    ///
    /// Returns `Some(Event::CountdownCompleted)` on the tick where the
    /// countdown crosses its target, and `None` otherwise.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.ticker.is_active() {
            return None;
        }

        let now = self.clock.now_ms();
        let elapsed_ms = self.observe(now);
        let crossed = self.advance_mode(elapsed_ms);

        let display = display_ms_for(self.mode, self.duration_ms, elapsed_ms);
        isolate(
            "update_live",
            self.notifier
                .update_live(&format_hms(display), subtitle_for(self.mode)),
        );

        if crossed {
            self.countdown_completed(elapsed_ms)
        } else {
            None
        }
    }

    /// Deliver a foreground/background transition.
    ///
    /// Going to the background persists the running session and suspends
    /// the tick. Coming back recomputes immediately instead of waiting for
    /// the next tick, which may complete a countdown that ran out meanwhile.
    pub fn set_lifecycle(&mut self, next: AppLifecycle) -> Vec<Event> {
        if next == self.lifecycle {
            return Vec::new();
        }
        self.lifecycle = next;
        self.sync_ticker();

        if !self.is_running() {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let elapsed_ms = self.observe(now);
        let at = self.clock.now_utc();

        match next {
            AppLifecycle::Background => {
                self.persist();
                debug!(elapsed_ms, "timer backgrounded");
                vec![Event::Backgrounded { elapsed_ms, at }]
            }
            AppLifecycle::Foreground => {
                let crossed = self.advance_mode(elapsed_ms);
                let mut events = vec![Event::Foregrounded {
                    elapsed_ms,
                    display_ms: display_ms_for(self.mode, self.duration_ms, elapsed_ms),
                    at,
                }];
                if crossed {
                    events.extend(self.countdown_completed(elapsed_ms));
                }
                debug!(elapsed_ms, "timer foregrounded");
                events
            }
        }
    }

    /// Turn the pending recovery offer into a stopped session ready to save.
    pub fn accept_recovery(&mut self) -> Option<Event> {
        if self.is_running() {
            warn!("recovery not applied: a session is running");
            return None;
        }
        let elapsed_ms = self.recovered_elapsed_ms.take()?;
        self.release_recovery();

        self.stopwatch = Stopwatch::stopped(elapsed_ms);
        self.observed_elapsed_ms = elapsed_ms;
        self.duration_ms = None;
        self.mode = None;
        self.phase = TimerPhase::Stopped;
        self.sync_ticker();

        debug!(elapsed_ms, "recovered session accepted");
        Some(Event::RecoveryAccepted {
            elapsed_ms,
            at: self.clock.now_utc(),
        })
    }

    pub fn discard_recovery(&mut self) -> Option<Event> {
        let recovered_elapsed_ms = self.recovered_elapsed_ms.take()?;
        self.release_recovery();
        debug!(recovered_elapsed_ms, "recovered session discarded");
        Some(Event::RecoveryDiscarded {
            recovered_elapsed_ms,
            at: self.clock.now_utc(),
        })
    }

    /// Write the pending offer back to the store so it is offered again if
    /// this process ends before the offer is accepted or discarded. Returns
    /// false when there is no offer or the write failed.
    pub fn hold_recovery(&self) -> bool {
        let Some(state) = self.recovered_state.as_ref() else {
            return false;
        };
        let written = state
            .to_json()
            .and_then(|json| self.kv.set(TIMER_STATE_KEY, &json));
        match written {
            Ok(()) => {
                debug!("recovery offer held until resolved");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to hold recovery offer");
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Drop the held snapshot once the offer is resolved.
    fn release_recovery(&mut self) {
        if self.recovered_state.take().is_none() || self.is_running() {
            return;
        }
        if let Err(e) = self.kv.remove(TIMER_STATE_KEY) {
            warn!(error = %e, "failed to erase held recovery offer");
        }
    }

    fn elapsed_at(&self, now_ms: i64) -> u64 {
        self.stopwatch
            .elapsed_ms(now_ms)
            .max(self.observed_elapsed_ms)
    }

    fn observe(&mut self, now_ms: i64) -> u64 {
        self.observed_elapsed_ms = self.elapsed_at(now_ms);
        self.observed_elapsed_ms
    }

    /// Flip countdown to overtime once the target is reached. Returns true
    /// only on the call that performs the flip.
    fn advance_mode(&mut self, elapsed_ms: u64) -> bool {
        match (self.mode, self.duration_ms) {
            (Some(TimerMode::Countdown), Some(target)) if elapsed_ms >= target => {
                self.mode = Some(TimerMode::Overtime);
                true
            }
            _ => false,
        }
    }

    fn countdown_completed(&mut self, elapsed_ms: u64) -> Option<Event> {
        let duration_ms = self.duration_ms?;
        isolate("countdown_completed", self.notifier.countdown_completed());
        debug!(duration_ms, elapsed_ms, "countdown completed, entering overtime");
        Some(Event::CountdownCompleted {
            duration_ms,
            elapsed_ms,
            at: self.clock.now_utc(),
        })
    }

    fn clear_session(&mut self) {
        self.stopwatch = Stopwatch::default();
        self.observed_elapsed_ms = 0;
        self.duration_ms = None;
        self.mode = None;
        self.phase = TimerPhase::Idle;
        self.sync_ticker();
        if let Err(e) = self.kv.remove(TIMER_STATE_KEY) {
            warn!(error = %e, "failed to erase persisted timer state");
        }
        isolate("dismiss", self.notifier.dismiss());
    }

    fn sync_ticker(&mut self) {
        self.ticker.sync(self.is_running(), self.lifecycle);
    }

    fn persist(&self) {
        let state = PersistedTimerState::capture(&self.stopwatch, self.duration_ms, self.mode);
        let written = state
            .to_json()
            .and_then(|json| self.kv.set(TIMER_STATE_KEY, &json));
        if let Err(e) = written {
            warn!(error = %e, "failed to persist timer state");
        }
    }
}
