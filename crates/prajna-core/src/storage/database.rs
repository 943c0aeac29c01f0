//! SQLite-backed store for sessions, tags, goals and application state.
//!
//! The schema is created and upgraded by [`super::migrations`] on open.
//! Record-level operations live in sibling modules as further `impl Database`
//! blocks; this file owns the connection and the key-value table.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::timer::KvStore;

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "prajna.db";

/// SQLite database for all durable state.
pub struct Database {
    pub(super) conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/prajna.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(DATABASE_FILE);
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database. Nothing survives the value.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    pub fn kv_remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.kv_set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.kv_remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
        db.kv_remove("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_remove("test").unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open_memory().unwrap();
        let enabled: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATABASE_FILE);
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn unopenable_path_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nested").join(DATABASE_FILE);
        let err = Database::open_at(&path).err().unwrap();
        assert!(matches!(
            err,
            crate::error::CoreError::Database(DatabaseError::OpenFailed { .. })
        ));
    }
}
