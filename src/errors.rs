//! HTTP error envelope and the mapping from service errors to status codes.
//!
//! Every failed request answers with `{"error": true, "message": ..., "data": null}`.
//! Upstream store failures keep their detail in the log only; the client
//! gets a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::auth_service::AuthError;
use crate::services::tokens::TokenError;
use crate::services::upload_service::UploadError;

/// A transport-level error: status code plus client-visible message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "message": self.message,
            "data": null
        }));

        (self.status, body).into_response()
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::RecordNotFound { .. } => ApiError::not_found(err.to_string()),
            UploadError::EmptyParts => ApiError::bad_request(err.to_string()),
            UploadError::Upstream(ref cause) => {
                tracing::error!("object store operation failed: {cause}");
                ApiError::new(StatusCode::BAD_GATEWAY, "storage operation failed")
            }
            UploadError::Store(ref cause) => {
                tracing::error!("upload record store failed: {cause}");
                ApiError::new(StatusCode::BAD_GATEWAY, "database operation failed")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired => ApiError::unauthorized(err.to_string()),
            AuthError::EmailTaken => ApiError::bad_request(err.to_string()),
            AuthError::Token(token_err) => token_err.into(),
            AuthError::Hash(ref cause) => {
                tracing::error!("password hashing failed: {cause}");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "credential processing failed",
                )
            }
            AuthError::Store(ref cause) => {
                tracing::error!("session store failed: {cause}");
                ApiError::new(StatusCode::BAD_GATEWAY, "database operation failed")
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::unauthorized("token expired"),
            TokenError::Invalid => ApiError::unauthorized("invalid token"),
            TokenError::Signing(ref cause) => {
                tracing::error!("token signing failed: {cause}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token issuance failed")
            }
            TokenError::Other(_) => ApiError::unauthorized("authentication failed"),
        }
    }
}
