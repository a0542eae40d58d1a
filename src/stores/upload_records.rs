//! Upload record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::{StoreError, StoreResult};
use crate::models::upload::{UploadRecord, UploadStatus};

const SELECT_COLUMNS: &str = "id, name, key, bucket, size, mime_type, status, url, \
                              uploaded_at, created_at, updated_at";

/// Keyed CRUD over upload records. `(key, bucket)` is the natural key.
#[async_trait]
pub trait UploadRecordStore: Send + Sync {
    async fn insert(&self, record: UploadRecord) -> StoreResult<UploadRecord>;

    async fn find_by_key_and_bucket(
        &self,
        key: &str,
        bucket: &str,
    ) -> StoreResult<Option<UploadRecord>>;

    /// Guarded status update: a record that already reached `completed` or
    /// `failed` keeps its status, `url`, and `uploaded_at`. Returns the record
    /// as stored after the attempt, or `None` when no record exists at all.
    async fn update_status_by_key_and_bucket(
        &self,
        key: &str,
        bucket: &str,
        status: UploadStatus,
        url: Option<&str>,
        uploaded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<UploadRecord>>;

    async fn delete_by_key_and_bucket(&self, key: &str, bucket: &str) -> StoreResult<()>;
}

/// SQLite-backed implementation over the shared pool.
#[derive(Clone)]
pub struct SqliteUploadRecordStore {
    db: Arc<SqlitePool>,
}

impl SqliteUploadRecordStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UploadRecordStore for SqliteUploadRecordStore {
    async fn insert(&self, record: UploadRecord) -> StoreResult<UploadRecord> {
        let inserted = sqlx::query_as::<_, UploadRecord>(&format!(
            "INSERT INTO files (id, name, key, bucket, size, mime_type, status, url, \
                                uploaded_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.key)
        .bind(&record.bucket)
        .bind(record.size)
        .bind(&record.mime_type)
        .bind(record.status)
        .bind(&record.url)
        .bind(record.uploaded_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&*self.db)
        .await?;

        Ok(inserted)
    }

    async fn find_by_key_and_bucket(
        &self,
        key: &str,
        bucket: &str,
    ) -> StoreResult<Option<UploadRecord>> {
        sqlx::query_as::<_, UploadRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM files WHERE key = ? AND bucket = ?"
        ))
        .bind(key)
        .bind(bucket)
        .fetch_optional(&*self.db)
        .await
        .map_err(StoreError::Sqlx)
    }

    async fn update_status_by_key_and_bucket(
        &self,
        key: &str,
        bucket: &str,
        status: UploadStatus,
        url: Option<&str>,
        uploaded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<UploadRecord>> {
        // Terminal states keep their fields; the WHERE clause makes the
        // update a no-op instead of a last-writer-wins overwrite.
        sqlx::query(
            "UPDATE files
             SET status = ?,
                 url = COALESCE(?, url),
                 uploaded_at = COALESCE(?, uploaded_at),
                 updated_at = ?
             WHERE key = ? AND bucket = ?
               AND status NOT IN ('completed', 'failed')",
        )
        .bind(status)
        .bind(url)
        .bind(uploaded_at)
        .bind(Utc::now())
        .bind(key)
        .bind(bucket)
        .execute(&*self.db)
        .await?;

        self.find_by_key_and_bucket(key, bucket).await
    }

    async fn delete_by_key_and_bucket(&self, key: &str, bucket: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM files WHERE key = ? AND bucket = ?")
            .bind(key)
            .bind(bucket)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}
