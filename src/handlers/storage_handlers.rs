//! Handlers for presigned uploads, multipart orchestration, and downloads.
//!
//! Validation happens here, at the boundary; the services only ever see
//! well-formed input.

use axum::{
    Json,
    extract::{Multipart, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::extract::AuthUser;
use crate::models::upload::PartETag;
use crate::state::AppState;

use super::success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUploadUrlReq {
    pub file_name: String,
    pub content_type: String,
    pub bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlReq {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateMultipartReq {
    pub file_name: String,
    pub content_type: String,
    pub bucket: String,
    pub file_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlReq {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub part_number: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlsReq {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub file_size: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartReq {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub parts: Vec<PartETag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortMultipartReq {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub upload_id: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileQuery {
    pub bucket: String,
    pub key: String,
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(())
}

fn require_positive(value: i64, field: &str) -> Result<(), ApiError> {
    if value <= 0 {
        return Err(ApiError::bad_request(format!("{} must be positive", field)));
    }
    Ok(())
}

/// POST `/api/storage/upload-url` — presign a single-shot PUT.
pub async fn generate_upload_url(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<GenerateUploadUrlReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.file_name, "fileName")?;
    require_non_empty(&req.content_type, "contentType")?;
    require_non_empty(&req.bucket, "bucket")?;

    let (key, upload_url) = state
        .uploads
        .generate_upload_url(&req.file_name, &req.content_type, &req.bucket)
        .await?;

    Ok(success(
        "upload URL generated",
        json!({ "key": key, "uploadUrl": upload_url }),
    ))
}

/// POST `/api/storage/download-url` — presign a GET.
pub async fn generate_download_url(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<DownloadUrlReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.bucket, "bucket")?;
    require_non_empty(&req.key, "key")?;

    let url = state
        .uploads
        .generate_download_url(&req.bucket, &req.key)
        .await?;

    Ok(success("download URL generated", json!({ "url": url })))
}

/// POST `/api/storage/upload` — direct upload via multipart form-data.
///
/// Expects a `bucket` text field and a `file` field carrying the payload.
pub async fn upload_file(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut bucket: Option<String> = None;
    let mut file: Option<(String, String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("bucket") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("bad bucket field: {}", e)))?;
                bucket = Some(value);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("bad file field: {}", e)))?;
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let bucket = bucket.ok_or_else(|| ApiError::bad_request("bucket is required"))?;
    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::bad_request("file is required"))?;
    require_non_empty(&bucket, "bucket")?;

    let stored = state
        .uploads
        .upload_buffer(&file_name, &content_type, &bucket, data)
        .await?;

    Ok(success(
        "file uploaded",
        json!({ "key": stored.key, "url": stored.url, "fileRecord": stored.record }),
    ))
}

/// POST `/api/storage/multipart/initiate`.
///
/// When `fileSize` is known, the response also carries the full batch of
/// presigned part URLs so the client can start uploading immediately.
pub async fn initiate_multipart(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<InitiateMultipartReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.file_name, "fileName")?;
    require_non_empty(&req.content_type, "contentType")?;
    require_non_empty(&req.bucket, "bucket")?;
    if let Some(size) = req.file_size {
        require_positive(size, "fileSize")?;
    }

    let initiated = state
        .uploads
        .initiate(&req.file_name, &req.content_type, &req.bucket, req.file_size)
        .await?;

    let presigned_urls = match req.file_size {
        Some(size) => Some(
            state
                .uploads
                .presign_part_urls(&initiated.upload_id, &initiated.key, &req.bucket, size)
                .await?,
        ),
        None => None,
    };

    Ok(success(
        "multipart upload initiated",
        json!({
            "uploadId": initiated.upload_id,
            "key": initiated.key,
            "fileRecord": initiated.record,
            "presignedUrls": presigned_urls,
        }),
    ))
}

/// POST `/api/storage/multipart/part-url` — presign one part.
pub async fn presign_part_url(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<PartUrlReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.bucket, "bucket")?;
    require_non_empty(&req.key, "key")?;
    require_non_empty(&req.upload_id, "uploadId")?;
    require_positive(req.part_number as i64, "partNumber")?;

    let url = state
        .uploads
        .presign_part_url(&req.upload_id, &req.key, &req.bucket, req.part_number)
        .await?;

    Ok(success("part URL generated", json!({ "url": url })))
}

/// POST `/api/storage/multipart/part-urls` — presign the whole batch.
pub async fn presign_part_urls(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<PartUrlsReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.bucket, "bucket")?;
    require_non_empty(&req.key, "key")?;
    require_non_empty(&req.upload_id, "uploadId")?;
    require_positive(req.file_size, "fileSize")?;

    let urls = state
        .uploads
        .presign_part_urls(&req.upload_id, &req.key, &req.bucket, req.file_size)
        .await?;

    Ok(success("part URLs generated", json!({ "presignedUrls": urls })))
}

/// POST `/api/storage/multipart/complete`.
pub async fn complete_multipart(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<CompleteMultipartReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.bucket, "bucket")?;
    require_non_empty(&req.key, "key")?;
    require_non_empty(&req.upload_id, "uploadId")?;
    if req.parts.is_empty() {
        return Err(ApiError::bad_request("parts must not be empty"));
    }

    let completed = state
        .uploads
        .complete_upload(&req.bucket, &req.key, &req.upload_id, req.parts)
        .await?;

    Ok(success(
        "upload completed",
        json!({
            "key": completed.key,
            "url": completed.url,
            "fileRecord": completed.record,
        }),
    ))
}

/// POST `/api/storage/multipart/abort`.
pub async fn abort_multipart(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<AbortMultipartReq>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&req.bucket, "bucket")?;
    require_non_empty(&req.key, "key")?;
    require_non_empty(&req.upload_id, "uploadId")?;

    let record = state
        .uploads
        .abort_upload(&req.bucket, &req.key, &req.upload_id)
        .await?;

    Ok(success("upload aborted", json!({ "fileRecord": record })))
}

/// GET `/api/storage/multipart/progress?uploadId=&bucket=&key=`.
pub async fn upload_progress(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = state
        .uploads
        .get_progress(&query.upload_id, &query.bucket, &query.key)
        .await?;

    Ok(success("upload progress", progress))
}

/// DELETE `/api/storage/file?bucket=&key=`.
pub async fn delete_file(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<DeleteFileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&query.bucket, "bucket")?;
    require_non_empty(&query.key, "key")?;

    state.uploads.delete_file(&query.bucket, &query.key).await?;

    Ok(success("file deleted", json!(null)))
}
