//! Published file records.

use crate::types::{FileId, FileRecord};
use crate::{Error, Result};

use super::{Database, FileRow, NewFileRecord};

impl Database {
    /// Insert records for a set of published files
    ///
    /// All rows are written in one transaction: either every record is stored
    /// or none is. Returns the stored records in input order.
    pub async fn insert_files(&self, files: &[NewFileRecord]) -> Result<Vec<FileRecord>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;
        // Stored at millisecond precision; keep the returned records identical
        let created_ms = chrono::Utc::now().timestamp_millis();
        let created_at = chrono::DateTime::from_timestamp_millis(created_ms)
            .ok_or_else(|| Error::Other(format!("timestamp out of range: {created_ms}")))?;
        let mut stored = Vec::with_capacity(files.len());

        for file in files {
            let id = FileId::new();
            sqlx::query("INSERT INTO files (id, url, name, created_at) VALUES (?, ?, ?, ?)")
                .bind(id.to_string())
                .bind(&file.url)
                .bind(&file.name)
                .bind(created_ms)
                .execute(&mut *tx)
                .await
                .map_err(Error::Sqlx)?;

            stored.push(FileRecord {
                id,
                url: file.url.clone(),
                name: file.name.clone(),
                created_at,
            });
        }

        tx.commit().await.map_err(Error::Sqlx)?;

        tracing::debug!(count = stored.len(), "Inserted file records");
        Ok(stored)
    }

    /// List every stored record, oldest first
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, url, name, created_at
            FROM files
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter()
            .map(|row| FileRecord::try_from(row).map_err(Error::Database))
            .collect()
    }

    /// Number of stored records
    pub async fn count_files(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)
    }
}
