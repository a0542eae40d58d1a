//! Shared application state handed to every handler.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{auth_service::AuthService, upload_service::UploadService};

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadService>,
    pub auth: Arc<AuthService>,

    /// Kept for the readiness probe.
    pub db: Arc<SqlitePool>,
}
