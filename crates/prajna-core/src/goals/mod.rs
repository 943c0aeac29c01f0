//! Meditation goals: a target number of hours over an inclusive date range.

mod progress;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub use progress::{
    compute_progress, evaluate, expected_status, sum_in_range, ExpectedStatus, GoalProgress,
    GoalWithProgress, ON_TRACK_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Year,
    Month,
    Custom,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodType::Year => "year",
            PeriodType::Month => "month",
            PeriodType::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "year" => Some(PeriodType::Year),
            "month" => Some(PeriodType::Month),
            "custom" => Some(PeriodType::Custom),
            _ => None,
        }
    }

    /// Inclusive bounds of the calendar year or month containing
    /// `reference`. Custom periods have no implied bounds.
    pub fn bounds(self, reference: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            PeriodType::Year => Some((
                NaiveDate::from_ymd_opt(reference.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(reference.year(), 12, 31)?,
            )),
            PeriodType::Month => {
                let first = reference.with_day(1)?;
                let next_first = if reference.month() == 12 {
                    NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(reference.year(), reference.month() + 1, 1)?
                };
                Some((first, next_first.pred_opt()?))
            }
            PeriodType::Custom => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub target_hours: f64,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

/// Create/update input for a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalInput {
    pub target_hours: f64,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_bounds() {
        assert_eq!(
            PeriodType::Year.bounds(date(2025, 7, 14)),
            Some((date(2025, 1, 1), date(2025, 12, 31)))
        );
    }

    #[test]
    fn month_bounds_handle_lengths() {
        assert_eq!(
            PeriodType::Month.bounds(date(2024, 2, 10)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            PeriodType::Month.bounds(date(2025, 12, 31)),
            Some((date(2025, 12, 1), date(2025, 12, 31)))
        );
    }

    #[test]
    fn custom_has_no_bounds() {
        assert_eq!(PeriodType::Custom.bounds(date(2025, 1, 1)), None);
        assert_eq!(PeriodType::parse("custom"), Some(PeriodType::Custom));
        assert_eq!(PeriodType::parse("week"), None);
    }
}
