use chrono::NaiveDate;
use clap::Subcommand;
use prajna_core::{
    Clock, CoreError, Database, GoalInput, GoalWithProgress, PeriodType, SystemClock,
    ValidationError,
};

use super::print_json;
use crate::format::format_hours;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a goal
    Add {
        /// Target hours for the period
        #[arg(long)]
        hours: f64,
        /// year, month or custom
        #[arg(long, default_value = "month", value_parser = parse_period)]
        period: PeriodType,
        /// First day (custom), or any day inside the year/month. Defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day, inclusive (custom only)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List goals with progress, soonest end first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one goal with progress as JSON
    Show {
        /// Goal ID
        id: i64,
    },
    /// Change a goal
    Edit {
        /// Goal ID
        id: i64,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long, value_parser = parse_period)]
        period: Option<PeriodType>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}

fn parse_period(value: &str) -> Result<PeriodType, String> {
    PeriodType::parse(&value.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown period '{value}' (expected year, month or custom)"))
}

/// Dates for a goal. Year and month periods snap to the calendar period
/// containing `reference`; custom periods need both ends.
fn period_range(
    period: PeriodType,
    reference: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    if let Some(bounds) = period.bounds(start.unwrap_or(reference)) {
        return Ok(bounds);
    }
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ValidationError::InvalidValue {
            field: "period".into(),
            message: "custom goals need --start and --end".into(),
        }),
    }
}

fn fetch(db: &Database, id: i64, today: NaiveDate) -> Result<GoalWithProgress, CoreError> {
    db.get_goal(id, today)?
        .ok_or(CoreError::NotFound { entity: "goal", id })
}

fn print_line(g: &GoalWithProgress) {
    let p = &g.progress;
    let status = if p.is_completed {
        "completed"
    } else if p.is_expired {
        "expired"
    } else {
        g.expected_status().map(|s| s.label()).unwrap_or("")
    };
    println!(
        "#{:<4} {:<6} {} .. {}  {} / {} ({:.1}%)  expected {}  {}",
        g.goal.id,
        g.goal.period_type.as_str(),
        g.goal.start_date,
        g.goal.end_date,
        format_hours(p.progress_seconds as f64 / 3600.0),
        format_hours(g.goal.target_hours),
        p.progress_percent,
        format_hours(p.expected_hours),
        status
    );
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = SystemClock.today();

    match action {
        GoalAction::Add {
            hours,
            period,
            start,
            end,
        } => {
            let (start_date, end_date) = period_range(period, today, start, end)?;
            let id = db.create_goal(&GoalInput {
                target_hours: hours,
                period_type: period,
                start_date,
                end_date,
            })?;
            print_json(&fetch(&db, id, today)?)?;
        }
        GoalAction::List { json } => {
            let goals = db.list_goals(today)?;
            if json {
                print_json(&goals)?;
            } else if goals.is_empty() {
                println!("no goals");
            } else {
                for g in &goals {
                    print_line(g);
                }
            }
        }
        GoalAction::Show { id } => {
            print_json(&fetch(&db, id, today)?)?;
        }
        GoalAction::Edit {
            id,
            hours,
            period,
            start,
            end,
        } => {
            let current = fetch(&db, id, today)?.goal;
            let period_type = period.unwrap_or(current.period_type);
            let (start_date, end_date) = match period_type {
                PeriodType::Custom => (
                    start.unwrap_or(current.start_date),
                    end.unwrap_or(current.end_date),
                ),
                _ => period_range(period_type, start.unwrap_or(current.start_date), None, None)?,
            };
            db.update_goal(
                id,
                &GoalInput {
                    target_hours: hours.unwrap_or(current.target_hours),
                    period_type,
                    start_date,
                    end_date,
                },
            )?;
            print_json(&fetch(&db, id, today)?)?;
        }
        GoalAction::Delete { id } => {
            db.delete_goal(id)?;
            println!("goal deleted: {id}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_goal_snaps_to_calendar_month() {
        let range = period_range(PeriodType::Month, date(2024, 2, 10), None, None).unwrap();
        assert_eq!(range, (date(2024, 2, 1), date(2024, 2, 29)));

        let range =
            period_range(PeriodType::Year, date(2024, 2, 10), Some(date(2025, 6, 1)), None)
                .unwrap();
        assert_eq!(range, (date(2025, 1, 1), date(2025, 12, 31)));
    }

    #[test]
    fn custom_goal_needs_both_ends() {
        let today = date(2024, 2, 10);
        assert!(period_range(PeriodType::Custom, today, Some(today), None).is_err());
        assert_eq!(
            period_range(PeriodType::Custom, today, Some(today), Some(date(2024, 3, 1))).unwrap(),
            (today, date(2024, 3, 1))
        );
    }

    #[test]
    fn periods_parse_case_insensitively() {
        assert_eq!(parse_period("Year"), Ok(PeriodType::Year));
        assert!(parse_period("week").is_err());
    }
}
