//! JWT issuance and verification for access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token verification failed: {0}")]
    Other(String),
}

/// Claims of a short-lived access token.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of a long-lived refresh token. The session id correlates the token
/// with its server-side session row.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier with fixed TTLs: 15 minutes for access tokens,
/// 7 days for refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(
        &self,
        user_id: Uuid,
        email: &str,
        session_id: Uuid,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            user_id,
            email: email.to_string(),
            session_id,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issue_refresh(&self, session_id: Uuid, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            session_id,
            user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Stateless verification: signature and expiry only. Expired and
    /// malformed tokens must stay distinguishable for the caller.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Invalid,
                _ => TokenError::Other(err.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 15 * 60, 7 * 24 * 60 * 60)
    }

    #[test]
    fn access_token_round_trips_claims() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let token = svc
            .issue_access(user_id, "alice@example.com", session_id)
            .unwrap();
        let claims = svc.verify_access(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.session_id, session_id);
    }

    #[test]
    fn expired_access_token_is_reported_as_expired() {
        // Negative TTL beyond the default 60s validation leeway.
        let svc = TokenService::new("test-secret", -120, 7 * 24 * 60 * 60);
        let token = svc
            .issue_access(Uuid::new_v4(), "alice@example.com", Uuid::new_v4())
            .unwrap();

        assert!(matches!(svc.verify_access(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let svc = service();
        let token = svc
            .issue_access(Uuid::new_v4(), "alice@example.com", Uuid::new_v4())
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            svc.verify_access(&tampered),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let svc = service();
        let other = TokenService::new("other-secret", 15 * 60, 7 * 24 * 60 * 60);
        let token = other
            .issue_access(Uuid::new_v4(), "alice@example.com", Uuid::new_v4())
            .unwrap();

        assert!(matches!(
            svc.verify_access(&token),
            Err(TokenError::Invalid)
        ));
    }
}
