//! Input checks applied before anything is written.

use chrono::NaiveDate;

use crate::error::ValidationError;

pub const MAX_TAG_NAME_LENGTH: usize = 50;
pub const MIN_COUNTDOWN_MINUTES: u64 = 1;
pub const MAX_COUNTDOWN_MINUTES: u64 = 1440;

/// Trim and cap a tag name. Empty names are rejected.
pub fn normalize_tag_name(name: &str) -> Result<String, ValidationError> {
    let trimmed: String = name.trim().chars().take(MAX_TAG_NAME_LENGTH).collect();
    let trimmed = trimmed.trim_end().to_string();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTagName);
    }
    Ok(trimmed)
}

pub fn validate_duration_seconds(seconds: i64) -> Result<(), ValidationError> {
    if seconds <= 0 {
        return Err(ValidationError::NonPositiveDuration(seconds));
    }
    Ok(())
}

pub fn validate_goal(
    target_hours: f64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), ValidationError> {
    if !target_hours.is_finite() || target_hours <= 0.0 {
        return Err(ValidationError::NonPositiveTarget(target_hours));
    }
    if end < start {
        return Err(ValidationError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Countdown length in milliseconds for a whole number of minutes.
pub fn countdown_ms(minutes: u64) -> Result<u64, ValidationError> {
    if !(MIN_COUNTDOWN_MINUTES..=MAX_COUNTDOWN_MINUTES).contains(&minutes) {
        return Err(ValidationError::CountdownOutOfRange {
            got: minutes,
            min: MIN_COUNTDOWN_MINUTES,
            max: MAX_COUNTDOWN_MINUTES,
        });
    }
    Ok(minutes * 60 * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tag_names_are_trimmed_and_capped() {
        assert_eq!(normalize_tag_name("  Breath  ").unwrap(), "Breath");
        let long = "x".repeat(80);
        assert_eq!(normalize_tag_name(&long).unwrap().len(), MAX_TAG_NAME_LENGTH);
        assert_eq!(normalize_tag_name("   "), Err(ValidationError::EmptyTagName));
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        let name = "é".repeat(60);
        assert_eq!(normalize_tag_name(&name).unwrap().chars().count(), 50);
    }

    #[test]
    fn durations_must_be_positive() {
        assert!(validate_duration_seconds(1).is_ok());
        assert_eq!(
            validate_duration_seconds(0),
            Err(ValidationError::NonPositiveDuration(0))
        );
    }

    #[test]
    fn goals_need_target_and_ordered_dates() {
        assert!(validate_goal(10.0, date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(validate_goal(0.0, date(2024, 1, 1), date(2024, 2, 1)).is_err());
        assert!(validate_goal(f64::NAN, date(2024, 1, 1), date(2024, 2, 1)).is_err());
        assert_eq!(
            validate_goal(5.0, date(2024, 2, 1), date(2024, 1, 1)),
            Err(ValidationError::InvalidDateRange {
                start: date(2024, 2, 1),
                end: date(2024, 1, 1),
            })
        );
    }

    #[test]
    fn countdown_range() {
        assert_eq!(countdown_ms(1).unwrap(), 60_000);
        assert_eq!(countdown_ms(1440).unwrap(), 1440 * 60_000);
        assert!(countdown_ms(0).is_err());
        assert!(countdown_ms(1441).is_err());
    }
}
