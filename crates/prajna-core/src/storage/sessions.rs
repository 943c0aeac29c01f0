//! Session records, their tag links and the aggregates built on them.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::tags::tag_from_row;
use super::Database;
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{NewSession, Session, SessionSource, SessionUpdate, SessionWithTags, Tag};
use crate::stats::{
    average_seconds, calculate_streaks, start_of_month, start_of_week, SessionStats, TagBreakdown,
    WeekStart,
};
use crate::validation::validate_duration_seconds;

const SESSION_COLUMNS: &str = "id, date, duration_seconds, source, created_at, updated_at";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let source: String = row.get(3)?;
    let source = SessionSource::parse(&source).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown session source '{source}'").into(),
        )
    })?;
    Ok(Session {
        id: row.get(0)?,
        date: row.get(1)?,
        duration_seconds: row.get(2)?,
        source,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Validate tag ids and write the links for `session_id`. Duplicate ids
/// collapse to one link.
fn link_tags(conn: &Connection, session_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut ids = tag_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut exists = conn.prepare_cached("SELECT 1 FROM tags WHERE id = ?1")?;
    let mut insert =
        conn.prepare_cached("INSERT INTO session_tags (session_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in ids {
        if !exists.exists(params![tag_id])? {
            return Err(ValidationError::UnknownTag(tag_id).into());
        }
        insert.execute(params![session_id, tag_id])?;
    }
    Ok(())
}

fn sum_seconds(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<i64> {
    Ok(conn.query_row(sql, params, |row| row.get(0))?)
}

impl Database {
    /// Insert a session with its tag links in one transaction.
    ///
    /// # Errors
    /// Validation errors for a non-positive duration or an unknown tag id;
    /// nothing is written in either case.
    pub fn create_session(&self, input: &NewSession) -> Result<i64> {
        validate_duration_seconds(input.duration_seconds)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO sessions (date, duration_seconds, source) VALUES (?1, ?2, ?3)",
            params![input.date, input.duration_seconds, input.source.as_str()],
        )?;
        let id = tx.last_insert_rowid();
        link_tags(&tx, id, &input.tag_ids)?;
        tx.commit()?;

        debug!(id, date = %input.date, seconds = input.duration_seconds, "created session");
        Ok(id)
    }

    /// Replace date, duration and tags of a session.
    pub fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<()> {
        validate_duration_seconds(update.duration_seconds)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE sessions SET date = ?1, duration_seconds = ?2, updated_at = datetime('now')
             WHERE id = ?3",
            params![update.date, update.duration_seconds, id],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "session", id });
        }
        tx.execute("DELETE FROM session_tags WHERE session_id = ?1", params![id])?;
        link_tags(&tx, id, &update.tag_ids)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_session(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "session", id });
        }
        debug!(id, "deleted session");
        Ok(())
    }

    pub fn get_session(&self, id: i64) -> Result<Option<SessionWithTags>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()?;
        let Some(session) = session else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.created_at, t.updated_at
             FROM tags t
             JOIN session_tags st ON st.tag_id = t.id
             WHERE st.session_id = ?1
             ORDER BY t.name COLLATE NOCASE",
        )?;
        let tags = stmt
            .query_map(params![id], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(SessionWithTags { session, tags }))
    }

    /// All sessions, newest date first, with their tags.
    pub fn list_sessions(&self) -> Result<Vec<SessionWithTags>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             ORDER BY date DESC, created_at DESC, id DESC"
        ))?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut links = self.conn.prepare(
            "SELECT st.session_id, t.id, t.name, t.created_at, t.updated_at
             FROM session_tags st
             JOIN tags t ON t.id = st.tag_id
             ORDER BY t.name COLLATE NOCASE",
        )?;
        let mut tags_by_session: HashMap<i64, Vec<Tag>> = HashMap::new();
        let rows = links.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Tag {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                },
            ))
        })?;
        for row in rows {
            let (session_id, tag) = row?;
            tags_by_session.entry(session_id).or_default().push(tag);
        }

        Ok(sessions
            .into_iter()
            .map(|session| {
                let tags = tags_by_session.remove(&session.id).unwrap_or_default();
                SessionWithTags { session, tags }
            })
            .collect())
    }

    /// Total seconds for sessions dated within `[start, end]`.
    pub fn sum_seconds_between(&self, start: NaiveDate, end: NaiveDate) -> Result<i64> {
        sum_seconds(
            &self.conn,
            "SELECT COALESCE(SUM(duration_seconds), 0) FROM sessions
             WHERE date BETWEEN ?1 AND ?2",
            params![start, end],
        )
    }

    /// Distinct session dates, newest first.
    pub fn distinct_session_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT date FROM sessions ORDER BY date DESC")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, NaiveDate>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dates)
    }

    pub fn session_stats(&self, today: NaiveDate, week_start: WeekStart) -> Result<SessionStats> {
        let (total_all_time, total_sessions): (i64, i64) = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0), COUNT(*) FROM sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let since = "SELECT COALESCE(SUM(duration_seconds), 0) FROM sessions WHERE date >= ?1";
        let total_month = sum_seconds(&self.conn, since, params![start_of_month(today)])?;
        let total_week = sum_seconds(&self.conn, since, params![start_of_week(today, week_start)])?;

        let streaks = calculate_streaks(&self.distinct_session_dates()?, today);

        Ok(SessionStats {
            total_seconds_all_time: total_all_time,
            total_seconds_this_month: total_month,
            total_seconds_this_week: total_week,
            average_session_seconds: average_seconds(total_all_time, total_sessions),
            total_sessions,
            current_streak: streaks.current_streak,
            longest_streak: streaks.longest_streak,
        })
    }

    /// Seconds per tag, every tag included, largest total first.
    pub fn tag_breakdown(&self) -> Result<Vec<TagBreakdown>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, COALESCE(SUM(s.duration_seconds), 0) AS total_seconds
             FROM tags t
             LEFT JOIN session_tags st ON st.tag_id = t.id
             LEFT JOIN sessions s ON s.id = st.session_id
             GROUP BY t.id
             ORDER BY total_seconds DESC, t.name COLLATE NOCASE ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TagBreakdown {
                    tag_id: row.get(0)?,
                    tag_name: row.get(1)?,
                    total_seconds: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
