//! Database layer for file-relay
//!
//! Handles SQLite persistence for records of published files.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`files`] - Published file records

use crate::error::DatabaseError;
use crate::types::{FileId, FileRecord};
use chrono::{TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod files;
mod migrations;

/// Published file to be inserted into the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    /// Shareable public URL
    pub url: String,
    /// Display name
    pub name: String,
}

/// File record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    /// UUID in hyphenated text form
    pub id: String,
    /// Shareable public URL
    pub url: String,
    /// Display name
    pub name: String,
    /// Unix timestamp in milliseconds when the record was written
    pub created_at: i64,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = DatabaseError;

    fn try_from(row: FileRow) -> std::result::Result<Self, Self::Error> {
        let id: FileId = row.id.parse().map_err(|e| DatabaseError::CorruptRecord {
            id: row.id.clone(),
            reason: format!("invalid id: {e}"),
        })?;
        let created_at = Utc
            .timestamp_millis_opt(row.created_at)
            .single()
            .ok_or_else(|| DatabaseError::CorruptRecord {
                id: row.id.clone(),
                reason: format!("invalid timestamp {}", row.created_at),
            })?;

        Ok(FileRecord {
            id,
            url: row.url,
            name: row.name,
            created_at,
        })
    }
}

/// Database handle for file-relay
pub struct Database {
    pool: SqlitePool,
}
