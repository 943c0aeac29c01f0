//! Goal progress and expected-progress projection.
//!
//! Everything here is a pure function of the goal, the logged seconds in its
//! range and today's date. Nothing reads the clock or the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Goal;
use crate::model::Session;

/// Share of the target within which a goal counts as on track.
pub const ON_TRACK_TOLERANCE: f64 = 0.05;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub progress_seconds: i64,
    /// Capped at 100.
    pub progress_percent: f64,
    pub remaining_hours: f64,
    pub is_completed: bool,
    pub is_expired: bool,
    /// Hours a linear pace would have reached by today.
    pub expected_hours: f64,
    pub expected_percent: f64,
    /// Actual minus expected hours. Positive means ahead.
    pub delta_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalWithProgress {
    #[serde(flatten)]
    pub goal: Goal,
    #[serde(flatten)]
    pub progress: GoalProgress,
}

impl GoalWithProgress {
    pub fn expected_status(&self) -> Option<ExpectedStatus> {
        expected_status(self.goal.target_hours, &self.progress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
    Ahead,
    OnTrack,
    Behind,
}

impl ExpectedStatus {
    pub fn label(self) -> &'static str {
        match self {
            ExpectedStatus::Ahead => "ahead",
            ExpectedStatus::OnTrack => "on track",
            ExpectedStatus::Behind => "behind",
        }
    }
}

/// Sum of durations for sessions dated within `[start, end]`.
pub fn sum_in_range<'a, I>(sessions: I, start: NaiveDate, end: NaiveDate) -> i64
where
    I: IntoIterator<Item = &'a Session>,
{
    sessions
        .into_iter()
        .filter(|s| s.date >= start && s.date <= end)
        .map(|s| s.duration_seconds)
        .sum()
}

/// Progress for `goal` given the seconds already logged in its range.
pub fn compute_progress(goal: &Goal, progress_seconds: i64, today: NaiveDate) -> GoalProgress {
    let target_hours = goal.target_hours;
    let target_seconds = target_hours * SECONDS_PER_HOUR;
    let progress = progress_seconds as f64;
    let progress_hours = progress / SECONDS_PER_HOUR;

    let progress_percent = if target_seconds > 0.0 {
        (progress / target_seconds * 100.0).min(100.0)
    } else {
        0.0
    };

    let total_days = (goal.end_date - goal.start_date).num_days();
    let elapsed_days = (today - goal.start_date).num_days().clamp(0, total_days.max(0));
    let ratio = if total_days > 0 {
        elapsed_days as f64 / total_days as f64
    } else if today >= goal.start_date {
        // Single-day goal: the whole target is due on its day.
        1.0
    } else {
        0.0
    };
    let expected_hours = target_hours * ratio.clamp(0.0, 1.0);
    let expected_percent = if target_hours > 0.0 {
        expected_hours / target_hours * 100.0
    } else {
        0.0
    };

    GoalProgress {
        progress_seconds,
        progress_percent,
        remaining_hours: (target_hours - progress_hours).max(0.0),
        is_completed: progress >= target_seconds,
        is_expired: goal.end_date < today,
        expected_hours,
        expected_percent,
        delta_hours: progress_hours - expected_hours,
    }
}

/// Attach progress computed from the given sessions.
pub fn evaluate<'a, I>(goal: Goal, sessions: I, today: NaiveDate) -> GoalWithProgress
where
    I: IntoIterator<Item = &'a Session>,
{
    let seconds = sum_in_range(sessions, goal.start_date, goal.end_date);
    let progress = compute_progress(&goal, seconds, today);
    GoalWithProgress { goal, progress }
}

/// Ahead/on-track/behind. Completed goals have no expected status.
pub fn expected_status(target_hours: f64, progress: &GoalProgress) -> Option<ExpectedStatus> {
    if progress.is_completed {
        return None;
    }
    let threshold = target_hours * ON_TRACK_TOLERANCE;
    Some(if progress.delta_hours > threshold {
        ExpectedStatus::Ahead
    } else if progress.delta_hours < -threshold {
        ExpectedStatus::Behind
    } else {
        ExpectedStatus::OnTrack
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::PeriodType;
    use crate::model::SessionSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target_hours: f64, start: NaiveDate, end: NaiveDate) -> Goal {
        Goal {
            id: 1,
            target_hours,
            period_type: PeriodType::Custom,
            start_date: start,
            end_date: end,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn session(id: i64, date: NaiveDate, duration_seconds: i64) -> Session {
        Session {
            id,
            date,
            duration_seconds,
            source: SessionSource::Manual,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn expected_progress_on_day_146_of_leap_year() {
        let g = goal(100.0, date(2024, 1, 1), date(2024, 12, 31));
        let today = date(2024, 5, 25);
        assert_eq!((today - g.start_date).num_days(), 145);

        let p = compute_progress(&g, 0, today);
        assert!((p.expected_hours - 39.73).abs() < 0.01, "{}", p.expected_hours);
        assert!((p.expected_percent - 39.73).abs() < 0.01);
        assert!((p.delta_hours + p.expected_hours).abs() < 1e-9);
    }

    #[test]
    fn percent_is_capped_and_remaining_floors_at_zero() {
        let g = goal(10.0, date(2024, 1, 1), date(2024, 1, 31));
        let p = compute_progress(&g, 15 * 3600, date(2024, 1, 10));
        assert_eq!(p.progress_percent, 100.0);
        assert_eq!(p.remaining_hours, 0.0);
        assert!(p.is_completed);
    }

    #[test]
    fn completion_is_inclusive_of_target() {
        let g = goal(2.0, date(2024, 1, 1), date(2024, 1, 31));
        assert!(compute_progress(&g, 7200, date(2024, 1, 5)).is_completed);
        assert!(!compute_progress(&g, 7199, date(2024, 1, 5)).is_completed);
    }

    #[test]
    fn delta_can_go_deeply_negative() {
        let g = goal(1000.0, date(2024, 1, 1), date(2024, 1, 11));
        let p = compute_progress(&g, 0, date(2024, 1, 11));
        assert_eq!(p.expected_hours, 1000.0);
        assert_eq!(p.delta_hours, -1000.0);
    }

    #[test]
    fn expiry_is_by_calendar_day() {
        let g = goal(1.0, date(2024, 1, 1), date(2024, 1, 31));
        assert!(!compute_progress(&g, 0, date(2024, 1, 31)).is_expired);
        assert!(compute_progress(&g, 0, date(2024, 2, 1)).is_expired);
    }

    #[test]
    fn expected_clamps_before_start_and_after_end() {
        let g = goal(30.0, date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(compute_progress(&g, 0, date(2024, 5, 1)).expected_hours, 0.0);
        assert_eq!(compute_progress(&g, 0, date(2024, 9, 1)).expected_hours, 30.0);
        assert_eq!(compute_progress(&g, 0, date(2024, 9, 1)).expected_percent, 100.0);
    }

    #[test]
    fn single_day_goal() {
        let day = date(2024, 3, 3);
        let g = goal(1.0, day, day);
        assert_eq!(compute_progress(&g, 0, day.pred_opt().unwrap()).expected_hours, 0.0);
        assert_eq!(compute_progress(&g, 0, day).expected_hours, 1.0);
    }

    #[test]
    fn zero_target_does_not_divide_by_zero() {
        let g = goal(0.0, date(2024, 1, 1), date(2024, 1, 31));
        let p = compute_progress(&g, 100, date(2024, 1, 15));
        assert_eq!(p.progress_percent, 0.0);
        assert_eq!(p.expected_percent, 0.0);
    }

    #[test]
    fn computation_is_idempotent() {
        let g = goal(50.0, date(2024, 1, 1), date(2024, 3, 31));
        let sessions = vec![
            session(1, date(2024, 1, 5), 1800),
            session(2, date(2024, 2, 5), 2400),
        ];
        let a = evaluate(g.clone(), &sessions, date(2024, 2, 10));
        let b = evaluate(g, &sessions, date(2024, 2, 10));
        assert_eq!(a, b);
    }

    #[test]
    fn only_sessions_in_range_count() {
        let sessions = vec![
            session(1, date(2023, 12, 31), 600),
            session(2, date(2024, 1, 1), 60),
            session(3, date(2024, 1, 31), 120),
            session(4, date(2024, 2, 1), 600),
        ];
        assert_eq!(sum_in_range(&sessions, date(2024, 1, 1), date(2024, 1, 31)), 180);
    }

    #[test]
    fn status_buckets_use_five_percent_of_target() {
        let g = goal(100.0, date(2024, 1, 1), date(2024, 1, 11));
        let today = date(2024, 1, 6); // expected 50h
        let status = |hours: f64| {
            let p = compute_progress(&g, (hours * 3600.0) as i64, today);
            expected_status(g.target_hours, &p)
        };
        assert_eq!(status(56.0), Some(ExpectedStatus::Ahead));
        assert_eq!(status(55.0), Some(ExpectedStatus::OnTrack));
        assert_eq!(status(45.0), Some(ExpectedStatus::OnTrack));
        assert_eq!(status(44.0), Some(ExpectedStatus::Behind));
        assert_eq!(status(100.0), None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn percent_capped_and_expected_bounded(
                target in 0.1f64..10_000.0,
                seconds in 0i64..100_000_000,
                length in 0i64..800,
                offset in -100i64..1000,
            ) {
                let start = date(2024, 1, 1);
                let g = goal(target, start, start + chrono::Duration::days(length));
                let today = start + chrono::Duration::days(offset);
                let p = compute_progress(&g, seconds, today);

                prop_assert!(p.progress_percent <= 100.0);
                prop_assert!(p.remaining_hours >= 0.0);
                prop_assert!(p.expected_hours >= 0.0 && p.expected_hours <= target);
                prop_assert!((p.delta_hours - (seconds as f64 / 3600.0 - p.expected_hours)).abs() < 1e-6);
            }
        }
    }
}
