//! Goal records. Reads come back with progress attached for a given day.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::Database;
use crate::error::{CoreError, Result};
use crate::goals::{compute_progress, Goal, GoalInput, GoalWithProgress, PeriodType};
use crate::validation::validate_goal;

/// Goal columns followed by the seconds logged inside its range.
const GOAL_WITH_SECONDS: &str = "SELECT g.id, g.target_hours, g.period_type, g.start_date, g.end_date,
            g.created_at, g.updated_at, COALESCE(SUM(s.duration_seconds), 0)
     FROM goals g
     LEFT JOIN sessions s ON s.date BETWEEN g.start_date AND g.end_date";

fn goal_row(row: &Row<'_>) -> rusqlite::Result<(Goal, i64)> {
    let period: String = row.get(2)?;
    let period_type = PeriodType::parse(&period).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown period type '{period}'").into(),
        )
    })?;
    let goal = Goal {
        id: row.get(0)?,
        target_hours: row.get(1)?,
        period_type,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    };
    Ok((goal, row.get(7)?))
}

fn with_progress((goal, seconds): (Goal, i64), today: NaiveDate) -> GoalWithProgress {
    let progress = compute_progress(&goal, seconds, today);
    GoalWithProgress { goal, progress }
}

impl Database {
    pub fn create_goal(&self, input: &GoalInput) -> Result<i64> {
        validate_goal(input.target_hours, input.start_date, input.end_date)?;
        self.conn.execute(
            "INSERT INTO goals (target_hours, period_type, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                input.target_hours,
                input.period_type.as_str(),
                input.start_date,
                input.end_date,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, target_hours = input.target_hours, "created goal");
        Ok(id)
    }

    pub fn update_goal(&self, id: i64, input: &GoalInput) -> Result<()> {
        validate_goal(input.target_hours, input.start_date, input.end_date)?;
        let changed = self.conn.execute(
            "UPDATE goals
             SET target_hours = ?1, period_type = ?2, start_date = ?3, end_date = ?4,
                 updated_at = datetime('now')
             WHERE id = ?5",
            params![
                input.target_hours,
                input.period_type.as_str(),
                input.start_date,
                input.end_date,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "goal", id });
        }
        Ok(())
    }

    pub fn delete_goal(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "goal", id });
        }
        Ok(())
    }

    pub fn get_goal(&self, id: i64, today: NaiveDate) -> Result<Option<GoalWithProgress>> {
        let row = self
            .conn
            .query_row(
                &format!("{GOAL_WITH_SECONDS} WHERE g.id = ?1 GROUP BY g.id"),
                params![id],
                goal_row,
            )
            .optional()?;
        Ok(row.map(|row| with_progress(row, today)))
    }

    /// All goals, soonest end date first, with progress as of `today`.
    pub fn list_goals(&self, today: NaiveDate) -> Result<Vec<GoalWithProgress>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_WITH_SECONDS} GROUP BY g.id ORDER BY g.end_date ASC, g.id ASC"
        ))?;
        let rows = stmt
            .query_map([], goal_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().map(|row| with_progress(row, today)).collect())
    }
}
