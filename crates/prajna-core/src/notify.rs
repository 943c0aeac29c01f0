//! Fire-and-forget notifications for the running timer.
//!
//! The alarm sound and the live "elapsed time" notification are side effects
//! of timer transitions. They are sent through [`TimerNotifier`], and every
//! call is wrapped so a failing notifier can never fail the timer itself.

use std::time::Duration;

use tracing::warn;

use crate::timer::TimerMode;

pub type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// One-way sink for timer side effects.
pub trait TimerNotifier {
    /// A countdown started; the alarm should fire after `after`.
    fn schedule_alarm(&mut self, after: Duration) -> NotifyResult;

    /// The countdown just reached zero.
    fn countdown_completed(&mut self) -> NotifyResult;

    /// Refresh the in-progress notification.
    fn update_live(&mut self, display: &str, subtitle: &str) -> NotifyResult;

    /// Session ended: dismiss the live notification and cancel any alarm.
    fn dismiss(&mut self) -> NotifyResult;
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl TimerNotifier for NoopNotifier {
    fn schedule_alarm(&mut self, _after: Duration) -> NotifyResult {
        Ok(())
    }

    fn countdown_completed(&mut self) -> NotifyResult {
        Ok(())
    }

    fn update_live(&mut self, _display: &str, _subtitle: &str) -> NotifyResult {
        Ok(())
    }

    fn dismiss(&mut self) -> NotifyResult {
        Ok(())
    }
}

/// Run a notifier call and swallow its error.
pub(crate) fn isolate(op: &'static str, result: NotifyResult) {
    if let Err(e) = result {
        warn!(op, error = %e, "timer notification failed");
    }
}

/// `HH:MM:SS` for a millisecond duration. Sub-second remainders are dropped.
pub fn format_hms(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Subtitle for the live notification.
pub fn subtitle_for(mode: Option<TimerMode>) -> &'static str {
    match mode {
        Some(TimerMode::Countdown) => "Countdown",
        Some(TimerMode::Overtime) => "Overtime",
        Some(TimerMode::OpenEnded) | None => "Meditating",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(999), "00:00:00");
        assert_eq!(format_hms(61_000), "00:01:01");
        assert_eq!(format_hms(3_723_000), "01:02:03");
        assert_eq!(format_hms(100 * 3600 * 1000), "100:00:00");
    }

    #[test]
    fn subtitles_follow_mode() {
        assert_eq!(subtitle_for(Some(TimerMode::Countdown)), "Countdown");
        assert_eq!(subtitle_for(Some(TimerMode::Overtime)), "Overtime");
        assert_eq!(subtitle_for(None), "Meditating");
    }
}
