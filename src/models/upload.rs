//! Upload records and multipart upload bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an upload record.
///
/// Transitions are monotonic: `pending → uploading → completed`, or
/// `pending/uploading → failed`. Nothing leaves `completed` or `failed`.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Failed,
}

impl UploadStatus {
    /// True for `completed` and `failed` — states with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

/// Metadata for one uploaded (or in-flight) object.
///
/// `(key, bucket)` uniquely identifies at most one record. `url` stays empty
/// and `uploaded_at` stays unset until the record reaches `completed`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Original file name as supplied by the client.
    pub name: String,

    /// Object key within the bucket.
    pub key: String,

    /// Bucket holding the object.
    pub bucket: String,

    /// Size in bytes. Unknown until completion for streamed uploads.
    pub size: Option<i64>,

    /// Content type (MIME type).
    pub mime_type: String,

    /// Current lifecycle state.
    pub status: UploadStatus,

    /// Public access URL. Empty until the upload completes.
    pub url: String,

    /// Set exactly once, on the transition to `completed`.
    pub uploaded_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One finished part of a multipart upload, as reported by the client.
///
/// The ETag comes back from the object store when the part body is PUT
/// against its presigned URL; part numbers are 1-based.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PartETag {
    pub e_tag: String,
    pub part_number: i32,
}

/// A presigned upload URL for one part.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PartUrl {
    pub part_number: i32,
    pub url: String,
}

/// Snapshot of upload progress as derivable from the stored record.
///
/// Per-part acknowledgements are not persisted, so in-flight uploads always
/// report 0% — only terminal states carry real numbers.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub upload_id: String,
    pub file_name: String,
    pub status: UploadStatus,
    pub progress: u8,
    pub uploaded_bytes: i64,
    pub total_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
