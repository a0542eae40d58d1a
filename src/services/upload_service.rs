//! Multipart upload orchestrator.
//!
//! Coordinates large-file uploads without routing file bytes through this
//! process: the client gets presigned part URLs, uploads straight to the
//! object store, and reports the resulting ETags back for completion. The
//! orchestrator keeps an auditable upload record alongside.
//!
//! Failure ordering is gateway call first, record write second. A crash in
//! between leaves an orphaned multipart upload with no record; the store's
//! own lifecycle rules garbage-collect those. No call here is retried — the
//! client can always redo a presign or a completion attempt.

use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::gateway::{GatewayError, ObjectStoreGateway};
use crate::models::upload::{PartETag, PartUrl, UploadProgress, UploadRecord, UploadStatus};
use crate::stores::{StoreError, upload_records::UploadRecordStore};

/// Minimum part size the multipart protocol accepts for all parts except the
/// last: 5 MiB.
pub const PART_SIZE: i64 = 5 * 1024 * 1024;

/// Cap on the original-name segment embedded in generated keys.
const KEY_BASE_NAME_MAX: usize = 20;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file record not found for `{key}` in bucket `{bucket}`")]
    RecordNotFound { bucket: String, key: String },
    #[error("completion requires at least one part")]
    EmptyParts,
    #[error(transparent)]
    Upstream(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Outcome of opening a multipart upload.
#[derive(Debug)]
pub struct InitiatedUpload {
    pub upload_id: String,
    pub key: String,
    pub record: UploadRecord,
}

/// Outcome of completing a multipart upload.
#[derive(Debug)]
pub struct CompletedUpload {
    pub key: String,
    pub url: String,
    pub record: UploadRecord,
}

/// Outcome of a single-shot presigned or direct upload.
#[derive(Debug)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub record: UploadRecord,
}

/// The orchestrator. Dependencies are injected at construction so tests can
/// substitute fakes for both the gateway and the record store.
pub struct UploadService {
    gateway: Arc<dyn ObjectStoreGateway>,
    records: Arc<dyn UploadRecordStore>,
    region: String,
    presign_expiry: Duration,
}

impl UploadService {
    pub fn new(
        gateway: Arc<dyn ObjectStoreGateway>,
        records: Arc<dyn UploadRecordStore>,
        region: impl Into<String>,
        presign_expiry: Duration,
    ) -> Self {
        Self {
            gateway,
            records,
            region: region.into(),
            presign_expiry,
        }
    }

    /// Generate a collision-resistant object key from an original file name.
    ///
    /// Shape: `{uuid}-{base}.{ext}`, where the base name is truncated to 20
    /// characters plus an ellipsis marker to keep keys bounded.
    pub fn generate_unique_key(file_name: &str) -> String {
        let (base, ext) = match file_name.split_once('.') {
            Some((base, _)) => (base, file_name.rsplit('.').next()),
            None => (file_name, None),
        };

        let base: String = if base.chars().count() > KEY_BASE_NAME_MAX {
            let truncated: String = base.chars().take(KEY_BASE_NAME_MAX).collect();
            format!("{}...", truncated)
        } else {
            base.to_string()
        };

        match ext {
            Some(ext) => format!("{}-{}.{}", Uuid::new_v4(), base, ext),
            None => format!("{}-{}", Uuid::new_v4(), base),
        }
    }

    /// Deterministic public URL for a completed object.
    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
    }

    fn object_metadata() -> HashMap<String, String> {
        HashMap::from([("uploaded-at".to_string(), Utc::now().to_rfc3339())])
    }

    /// Open a multipart upload and persist a `pending` record.
    ///
    /// The gateway goes first: if it fails, no record is persisted.
    pub async fn initiate(
        &self,
        file_name: &str,
        content_type: &str,
        bucket: &str,
        file_size: Option<i64>,
    ) -> UploadResult<InitiatedUpload> {
        let key = Self::generate_unique_key(file_name);

        let upload_id = self
            .gateway
            .create_multipart_upload(bucket, &key, content_type, &Self::object_metadata())
            .await?;

        let now = Utc::now();
        let record = self
            .records
            .insert(UploadRecord {
                id: Uuid::new_v4(),
                name: file_name.to_string(),
                key: key.clone(),
                bucket: bucket.to_string(),
                size: file_size,
                mime_type: content_type.to_string(),
                status: UploadStatus::Pending,
                url: String::new(),
                uploaded_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(bucket, key = %key, upload_id = %upload_id, "initiated multipart upload");

        Ok(InitiatedUpload {
            upload_id,
            key,
            record,
        })
    }

    /// Presign one URL per part for the whole file.
    ///
    /// Part count is `ceil(file_size / 5 MiB)`. Presigning fans out
    /// concurrently; the collected result keeps partNumber↔URL pairing
    /// regardless of completion order. Any individual failure discards the
    /// whole batch — the caller retries it wholesale.
    pub async fn presign_part_urls(
        &self,
        upload_id: &str,
        key: &str,
        bucket: &str,
        file_size: i64,
    ) -> UploadResult<Vec<PartUrl>> {
        let total_parts = file_size.div_ceil(PART_SIZE) as i32;

        let urls = try_join_all((1..=total_parts).map(|part_number| async move {
            self.gateway
                .presign_upload_part(bucket, key, upload_id, part_number, self.presign_expiry)
                .await
                .map(|url| PartUrl { part_number, url })
        }))
        .await?;

        Ok(urls)
    }

    /// Presign a single part URL, e.g. to refresh one that expired.
    pub async fn presign_part_url(
        &self,
        upload_id: &str,
        key: &str,
        bucket: &str,
        part_number: i32,
    ) -> UploadResult<String> {
        let url = self
            .gateway
            .presign_upload_part(bucket, key, upload_id, part_number, self.presign_expiry)
            .await?;

        Ok(url)
    }

    /// Finalize a multipart upload.
    ///
    /// Parts are sorted ascending by part number before submission — the
    /// store rejects out-of-order part lists. On gateway failure the record
    /// is left unchanged so completion can be retried.
    pub async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        mut parts: Vec<PartETag>,
    ) -> UploadResult<CompletedUpload> {
        if parts.is_empty() {
            return Err(UploadError::EmptyParts);
        }

        self.records
            .find_by_key_and_bucket(key, bucket)
            .await?
            .ok_or_else(|| UploadError::RecordNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        parts.sort_by_key(|part| part.part_number);

        self.gateway
            .complete_multipart_upload(bucket, key, upload_id, &parts)
            .await?;

        let url = self.public_url(bucket, key);
        let record = self
            .records
            .update_status_by_key_and_bucket(
                key,
                bucket,
                UploadStatus::Completed,
                Some(&url),
                Some(Utc::now()),
            )
            .await?
            .ok_or_else(|| UploadError::RecordNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        info!(bucket, key, upload_id, parts = parts.len(), "completed multipart upload");

        Ok(CompletedUpload {
            key: key.to_string(),
            url,
            record,
        })
    }

    /// Abort a multipart upload and mark its record `failed`.
    ///
    /// Terminal: retrying the file requires a fresh `initiate`.
    pub async fn abort_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> UploadResult<UploadRecord> {
        self.gateway
            .abort_multipart_upload(bucket, key, upload_id)
            .await?;

        let record = self
            .records
            .update_status_by_key_and_bucket(key, bucket, UploadStatus::Failed, None, None)
            .await?
            .ok_or_else(|| UploadError::RecordNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        info!(bucket, key, upload_id, "aborted multipart upload");

        Ok(record)
    }

    /// Progress as derivable from the stored record.
    ///
    /// Per-part acknowledgements are not persisted, so in-flight uploads
    /// report 0% — only terminal states carry real numbers.
    pub async fn get_progress(
        &self,
        upload_id: &str,
        bucket: &str,
        key: &str,
    ) -> UploadResult<UploadProgress> {
        let record = self
            .records
            .find_by_key_and_bucket(key, bucket)
            .await?
            .ok_or_else(|| UploadError::RecordNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        let total_bytes = record.size.unwrap_or(0);
        let (progress, uploaded_bytes) = match record.status {
            UploadStatus::Completed => (100, total_bytes),
            UploadStatus::Failed => (0, total_bytes),
            UploadStatus::Pending | UploadStatus::Uploading => (0, 0),
        };

        Ok(UploadProgress {
            upload_id: upload_id.to_string(),
            file_name: record.name,
            status: record.status,
            progress,
            uploaded_bytes,
            total_bytes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Presign a single-shot PUT for a small file. No record is persisted —
    /// the client owns the outcome.
    pub async fn generate_upload_url(
        &self,
        file_name: &str,
        content_type: &str,
        bucket: &str,
    ) -> UploadResult<(String, String)> {
        let key = Self::generate_unique_key(file_name);
        let url = self
            .gateway
            .presign_put_object(bucket, &key, content_type, self.presign_expiry)
            .await?;

        Ok((key, url))
    }

    /// Presign a GET for downloading an existing object.
    pub async fn generate_download_url(&self, bucket: &str, key: &str) -> UploadResult<String> {
        let url = self
            .gateway
            .presign_get_object(bucket, key, self.presign_expiry)
            .await?;

        Ok(url)
    }

    /// Upload a small payload directly through the server and persist a
    /// `completed` record.
    pub async fn upload_buffer(
        &self,
        file_name: &str,
        content_type: &str,
        bucket: &str,
        body: Bytes,
    ) -> UploadResult<StoredObject> {
        let key = Self::generate_unique_key(file_name);
        let size = body.len() as i64;

        self.gateway
            .put_object(bucket, &key, content_type, body)
            .await?;

        let url = self.public_url(bucket, &key);
        let now = Utc::now();
        let record = self
            .records
            .insert(UploadRecord {
                id: Uuid::new_v4(),
                name: file_name.to_string(),
                key: key.clone(),
                bucket: bucket.to_string(),
                size: Some(size),
                mime_type: content_type.to_string(),
                status: UploadStatus::Completed,
                url: url.clone(),
                uploaded_at: Some(now),
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(StoredObject { key, url, record })
    }

    /// Delete an object and its record.
    pub async fn delete_file(&self, bucket: &str, key: &str) -> UploadResult<()> {
        self.gateway.delete_object(bucket, key).await?;
        self.records.delete_by_key_and_bucket(key, bucket).await?;

        Ok(())
    }
}
