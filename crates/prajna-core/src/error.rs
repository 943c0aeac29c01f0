//! Core error types for prajna-core.
//!
//! Errors are split by concern: the store, the configuration file and input
//! validation. Everything funnels into [`CoreError`] at the library boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for prajna-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A record addressed by id does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A constraint (unique, check, foreign key) rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
///
/// Raised before anything reaches the store, so a rejected input never
/// leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Tag name empty after trimming
    #[error("Tag name cannot be empty")]
    EmptyTagName,

    /// Tag name already used (case-insensitive)
    #[error("A tag named '{0}' already exists")]
    DuplicateTag(String),

    /// Session duration must be positive
    #[error("Session duration must be greater than 0 (got {0} seconds)")]
    NonPositiveDuration(i64),

    /// Goal target must be positive
    #[error("Target hours must be greater than 0 (got {0})")]
    NonPositiveTarget(f64),

    /// Goal range inverted
    #[error("End date ({end}) must not be before start date ({start})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Countdown outside the supported range
    #[error("Countdown must be between {min} and {max} minutes (got {got})")]
    CountdownOutOfRange { got: u64, min: u64, max: u64 },

    /// Referenced tag does not exist
    #[error("Unknown tag id {0}")]
    UnknownTag(i64),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => {
                    DatabaseError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_failures_are_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT NOT NULL UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (name) VALUES ('a')", [])
            .unwrap_err();
        assert!(matches!(DatabaseError::from(err), DatabaseError::Constraint(_)));
    }

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::EmptyTagName.to_string(),
            "Tag name cannot be empty"
        );
        let err: CoreError = ValidationError::NonPositiveTarget(0.0).into();
        assert!(err.to_string().contains("Target hours must be greater than 0"));
    }
}
