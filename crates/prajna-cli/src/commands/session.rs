use chrono::NaiveDate;
use clap::Subcommand;
use prajna_core::{
    Clock, CoreError, Database, NewSession, SessionSource, SessionUpdate, SessionWithTags,
    SystemClock,
};

use super::{print_json, resolve_tags};
use crate::format::format_duration;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Log a session by hand
    Add {
        /// Length in minutes
        #[arg(long)]
        minutes: u64,
        /// Day of the session (YYYY-MM-DD). Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Tag name (repeatable, created if missing)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List sessions, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one session as JSON
    Show {
        /// Session ID
        id: i64,
    },
    /// Change a session's date, length or tags
    Edit {
        /// Session ID
        id: i64,
        #[arg(long)]
        minutes: Option<u64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Replace the tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove all tags
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: i64,
    },
}

fn minutes_to_seconds(minutes: u64) -> Result<i64, Box<dyn std::error::Error>> {
    minutes
        .checked_mul(60)
        .and_then(|s| i64::try_from(s).ok())
        .ok_or_else(|| format!("{minutes} minutes is too long").into())
}

fn fetch(db: &Database, id: i64) -> Result<SessionWithTags, CoreError> {
    db.get_session(id)?
        .ok_or(CoreError::NotFound { entity: "session", id })
}

fn print_line(s: &SessionWithTags) {
    let tags: Vec<&str> = s.tags.iter().map(|t| t.name.as_str()).collect();
    println!(
        "#{:<5} {}  {:>8}  {:<6}  {}",
        s.session.id,
        s.session.date,
        format_duration(s.session.duration_seconds),
        s.session.source.as_str(),
        tags.join(", ")
    );
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::Add {
            minutes,
            date,
            tags,
        } => {
            let tag_ids = resolve_tags(&db, &tags)?;
            let id = db.create_session(&NewSession {
                date: date.unwrap_or_else(|| SystemClock.today()),
                duration_seconds: minutes_to_seconds(minutes)?,
                source: SessionSource::Manual,
                tag_ids,
            })?;
            print_json(&fetch(&db, id)?)?;
        }
        SessionAction::List { json, limit } => {
            let mut sessions = db.list_sessions()?;
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            if json {
                print_json(&sessions)?;
            } else if sessions.is_empty() {
                println!("no sessions");
            } else {
                for s in &sessions {
                    print_line(s);
                }
            }
        }
        SessionAction::Show { id } => {
            print_json(&fetch(&db, id)?)?;
        }
        SessionAction::Edit {
            id,
            minutes,
            date,
            tags,
            clear_tags,
        } => {
            let current = fetch(&db, id)?;
            let tag_ids = if clear_tags {
                Vec::new()
            } else if tags.is_empty() {
                current.tags.iter().map(|t| t.id).collect()
            } else {
                resolve_tags(&db, &tags)?
            };
            let duration_seconds = match minutes {
                Some(minutes) => minutes_to_seconds(minutes)?,
                None => current.session.duration_seconds,
            };
            db.update_session(
                id,
                &SessionUpdate {
                    date: date.unwrap_or(current.session.date),
                    duration_seconds,
                    tag_ids,
                },
            )?;
            print_json(&fetch(&db, id)?)?;
        }
        SessionAction::Delete { id } => {
            db.delete_session(id)?;
            println!("session deleted: {id}");
        }
    }
    Ok(())
}
