//! Bearer-token extractor for authenticated routes.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::errors::ApiError;
use crate::services::tokens::AccessClaims;
use crate::state::AppState;

/// Verified identity of the caller, taken from the `Authorization` header.
///
/// Verification is stateless (signature + expiry); no session lookup happens
/// here.
pub struct AuthUser(pub AccessClaims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("authentication token required"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("authentication token required"))?;

        let claims = state.auth.verify(token)?;
        Ok(AuthUser(claims))
    }
}
