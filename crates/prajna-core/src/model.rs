//! Durable records: sessions and tags, plus their write inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    Timer,
    Manual,
}

impl SessionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionSource::Timer => "timer",
            SessionSource::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timer" => Some(SessionSource::Timer),
            "manual" => Some(SessionSource::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub date: NaiveDate,
    pub duration_seconds: i64,
    pub source: SessionSource,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWithTags {
    #[serde(flatten)]
    pub session: Session,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub date: NaiveDate,
    pub duration_seconds: i64,
    pub source: SessionSource,
    pub tag_ids: Vec<i64>,
}

impl NewSession {
    /// A session produced by the timer, rounded down to whole seconds.
    pub fn from_timer(date: NaiveDate, elapsed_ms: u64, tag_ids: Vec<i64>) -> Self {
        Self {
            date,
            duration_seconds: (elapsed_ms / 1000) as i64,
            source: SessionSource::Timer,
            tag_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub date: NaiveDate,
    pub duration_seconds: i64,
    pub tag_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_sessions_truncate_to_seconds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let s = NewSession::from_timer(date, 61_999, vec![]);
        assert_eq!(s.duration_seconds, 61);
        assert_eq!(s.source, SessionSource::Timer);
    }

    #[test]
    fn source_strings_roundtrip() {
        for source in [SessionSource::Timer, SessionSource::Manual] {
            assert_eq!(SessionSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(SessionSource::parse("import"), None);
    }
}
