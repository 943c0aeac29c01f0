//! Statistics module for Prajna
//!
//! Aggregate views over logged sessions: totals for the current week and
//! month, averages, per-tag breakdowns and day streaks. The SQL side lives in
//! `storage::sessions`; this module holds the types and the date math.

mod streak;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub use streak::{calculate_streaks, Streaks};

/// First day of the statistics week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_seconds_all_time: i64,
    pub total_seconds_this_month: i64,
    pub total_seconds_this_week: i64,
    pub average_session_seconds: i64,
    pub total_sessions: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBreakdown {
    pub tag_id: i64,
    pub tag_name: String,
    pub total_seconds: i64,
}

pub fn start_of_month(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

pub fn start_of_week(today: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let offset = (7 + today.weekday().num_days_from_monday()
        - week_start.weekday().num_days_from_monday())
        % 7;
    today - Duration::days(i64::from(offset))
}

/// Rounded mean, 0 when there are no sessions.
pub fn average_seconds(total_seconds: i64, count: i64) -> i64 {
    if count <= 0 {
        return 0;
    }
    (total_seconds as f64 / count as f64).round() as i64
}
