//! Human-readable renderings shared by the commands.

use prajna_core::notify::format_hms;
use prajna_core::TimerMode;

/// `1h 5m`, or `5m` under an hour.
pub fn format_duration(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

pub fn format_hours(hours: f64) -> String {
    format_duration((hours * 3600.0).round() as i64)
}

/// Timer readout; overtime is shown as `+HH:MM:SS`.
pub fn format_timer(mode: Option<TimerMode>, display_ms: u64) -> String {
    match mode {
        Some(TimerMode::Overtime) => format!("+{}", format_hms(display_ms)),
        _ => format_hms(display_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_drop_hours_when_zero() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(20 * 60), "20m");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3600 + 5 * 60 + 30), "1h 5m");
    }

    #[test]
    fn hours_round_to_nearest_second() {
        assert_eq!(format_hours(1.5), "1h 30m");
        assert_eq!(format_hours(0.25), "15m");
    }

    #[test]
    fn overtime_gets_plus_prefix() {
        assert_eq!(format_timer(Some(TimerMode::Countdown), 61_000), "00:01:01");
        assert_eq!(format_timer(Some(TimerMode::Overtime), 61_000), "+00:01:01");
        assert_eq!(format_timer(None, 0), "00:00:00");
    }
}
