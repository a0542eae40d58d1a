//! Authentication endpoints: register, login, token refresh, logout.
//!
//! The refresh token travels in an HttpOnly cookie scoped to the auth
//! routes; only the short-lived access token is exposed to script.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

use super::success;

const REFRESH_COOKIE: &str = "refreshToken";
const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct CredentialsReq {
    pub email: String,
    pub password: String,
}

fn validate_credentials(req: &CredentialsReq) -> Result<(), ApiError> {
    if !req.email.contains('@') || req.email.trim().is_empty() {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    Ok(())
}

fn refresh_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=None; Path=/api/auth; Max-Age={}",
        REFRESH_COOKIE, token, max_age_secs
    )
}

fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == REFRESH_COOKIE).then(|| value.to_string())
    })
}

/// POST `/api/auth/register`.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsReq>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&req)?;

    state.auth.sign_up(&req.email, &req.password).await?;

    Ok(success("user signed up successfully", json!(null)))
}

/// POST `/api/auth/login`.
///
/// The access token goes in the body; the refresh token only in the cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsReq>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&req)?;

    let pair = state.auth.sign_in(&req.email, &req.password).await?;

    let cookie = refresh_cookie(&pair.refresh_token, REFRESH_COOKIE_MAX_AGE_SECS);
    Ok((
        [(header::SET_COOKIE, cookie)],
        success("login successful", json!({ "token": pair.access_token })),
    ))
}

/// GET `/api/auth/access-token` — exchange the refresh cookie for a fresh
/// access token.
pub async fn access_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = read_refresh_cookie(&headers)
        .ok_or_else(|| ApiError::unauthorized("refresh token required"))?;

    let token = state.auth.refresh_access_token(&refresh_token).await?;

    Ok(success("access token issued", json!({ "token": token })))
}

/// POST `/api/auth/logout` — revoke the caller's session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(claims.session_id).await?;

    let cookie = refresh_cookie("", 0);
    Ok((
        [(header::SET_COOKIE, cookie)],
        success("logged out", json!(null)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn refresh_cookie_is_http_only_and_scoped() {
        let cookie = refresh_cookie("tok", REFRESH_COOKIE_MAX_AGE_SECS);
        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/api/auth"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn refresh_cookie_is_parsed_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; other=1"),
        );
        assert_eq!(
            read_refresh_cookie(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert!(read_refresh_cookie(&HeaderMap::new()).is_none());
    }
}
