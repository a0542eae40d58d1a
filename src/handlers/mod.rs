//! HTTP handlers. Thin request parsing + response shaping around the services.

pub mod auth_handlers;
pub mod health_handlers;
pub mod storage_handlers;

use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

/// Success envelope shared by every endpoint:
/// `{"error": false, "message": ..., "data": ...}`.
pub(crate) fn success<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({
        "error": false,
        "message": message,
        "data": data
    }))
}
