//! Tag records. Names are unique without regard to case.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::Database;
use crate::error::{CoreError, Result, ValidationError};
use crate::model::Tag;
use crate::validation::normalize_tag_name;

const TAG_COLUMNS: &str = "id, name, created_at, updated_at";

pub(super) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

impl Database {
    /// Create a tag and return its id.
    ///
    /// # Errors
    /// `DuplicateTag` when another tag has the same name ignoring case.
    pub fn create_tag(&self, name: &str) -> Result<i64> {
        let name = normalize_tag_name(name)?;
        self.ensure_name_free(&name, None)?;
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %name, "created tag");
        Ok(id)
    }

    /// All tags ordered by name.
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TAG_COLUMNS} FROM tags ORDER BY name COLLATE NOCASE ASC"
        ))?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?1"),
                params![id],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// Case-insensitive lookup after the same trimming applied on create.
    pub fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let name = normalize_tag_name(name)?;
        let tag = self
            .conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags WHERE name = ?1 COLLATE NOCASE"),
                params![name],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// Find a tag by name, creating it if none exists.
    pub fn ensure_tag(&self, name: &str) -> Result<Tag> {
        if let Some(tag) = self.find_tag_by_name(name)? {
            return Ok(tag);
        }
        let id = self.create_tag(name)?;
        self.get_tag(id)?
            .ok_or(CoreError::NotFound { entity: "tag", id })
    }

    pub fn rename_tag(&self, id: i64, name: &str) -> Result<()> {
        let name = normalize_tag_name(name)?;
        self.ensure_name_free(&name, Some(id))?;
        let changed = self.conn.execute(
            "UPDATE tags SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![name, id],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "tag", id });
        }
        Ok(())
    }

    /// Delete a tag. Session links go with it; the sessions stay.
    pub fn delete_tag(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CoreError::NotFound { entity: "tag", id });
        }
        debug!(id, "deleted tag");
        Ok(())
    }

    fn ensure_name_free(&self, name: &str, except: Option<i64>) -> Result<()> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM tags WHERE name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        match existing {
            Some(id) if Some(id) != except => {
                Err(ValidationError::DuplicateTag(name.to_string()).into())
            }
            _ => Ok(()),
        }
    }
}
