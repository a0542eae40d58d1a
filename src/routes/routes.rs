//! Route table for the upload gateway.
//!
//! ## Structure
//! - **Health endpoints** (mounted at root)
//!   - `GET    /healthz` — liveness
//!   - `GET    /readyz`  — readiness (DB probe)
//!
//! - **Auth endpoints** (`/api/auth`)
//!   - `POST   /register`     — create a password principal
//!   - `POST   /login`        — issue access token + refresh cookie
//!   - `GET    /access-token` — exchange refresh cookie for access token
//!   - `POST   /logout`       — revoke session, clear cookie
//!
//! - **Storage endpoints** (`/api/storage`, bearer token required)
//!   - `POST   /upload-url`          — presign single-shot PUT
//!   - `POST   /download-url`        — presign GET
//!   - `POST   /upload`              — direct multipart/form-data upload
//!   - `POST   /multipart/initiate`  — open multipart upload
//!   - `POST   /multipart/part-url`  — presign one part
//!   - `POST   /multipart/part-urls` — presign the whole batch
//!   - `POST   /multipart/complete`  — stitch parts
//!   - `POST   /multipart/abort`     — abort and mark failed
//!   - `GET    /multipart/progress`  — record-derived progress
//!   - `DELETE /file`                — delete object + record

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers::{
    auth_handlers::{access_token, login, logout, register},
    health_handlers::{healthz, readyz},
    storage_handlers::{
        abort_multipart, complete_multipart, delete_file, generate_download_url,
        generate_upload_url, initiate_multipart, presign_part_url, presign_part_urls,
        upload_file, upload_progress,
    },
};
use crate::state::AppState;

/// Build and return the router for all endpoints.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/auth", auth_routes())
        .nest("/api/storage", storage_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/access-token", get(access_token))
        .route("/logout", post(logout))
}

fn storage_routes() -> Router<AppState> {
    Router::new()
        .route("/upload-url", post(generate_upload_url))
        .route("/download-url", post(generate_download_url))
        .route("/upload", post(upload_file))
        .route("/multipart/initiate", post(initiate_multipart))
        .route("/multipart/part-url", post(presign_part_url))
        .route("/multipart/part-urls", post(presign_part_urls))
        .route("/multipart/complete", post(complete_multipart))
        .route("/multipart/abort", post(abort_multipart))
        .route("/multipart/progress", get(upload_progress))
        .route("/file", delete(delete_file))
}
