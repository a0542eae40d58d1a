//! Session/token manager.
//!
//! Issues short-lived access tokens and long-lived rotatable sessions,
//! verifies bearer tokens, and revokes by deleting the session row.
//!
//! Verification is stateless: a logged-out session's access token stays
//! acceptable until it expires naturally. The 15 minute access TTL bounds
//! that window instead of paying a store lookup per request.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Argon2Params;
use crate::services::password;
use crate::services::tokens::{AccessClaims, TokenError, TokenService};
use crate::stores::{StoreError, sessions::SessionStore, users::UserStore};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately identical for unknown email, missing password credential,
    /// and wrong password — callers must not learn which one failed.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user with this email already exists")]
    EmailTaken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Both credentials issued at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenService,
    argon2: Argon2Params,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenService,
        argon2: Argon2Params,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            argon2,
        }
    }

    /// Authenticate by email and password; on success issue a token pair and
    /// persist the backing session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let account = self
            .users
            .find_password_account(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = account.password.ok_or(AuthError::InvalidCredentials)?;

        // Memory-hard verification runs off the async scheduler.
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = Uuid::new_v4();
        let access_token = self.tokens.issue_access(user.id, &user.email, session_id)?;
        let refresh_token = self.tokens.issue_refresh(session_id, user.id)?;

        let expires_at = Utc::now() + self.tokens.refresh_ttl();
        self.sessions
            .create_session(session_id, user.id, &refresh_token, expires_at)
            .await?;

        info!(user_id = %user.id, session_id = %session_id, "user signed in");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Register a new password principal.
    ///
    /// User and credential are two writes with no compensating rollback; a
    /// crash between them leaves a password-less user that cannot sign in.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<()> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let params = self.argon2;
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&password, params))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(AuthError::Hash)?;

        let name = email.split('@').next().unwrap_or(email);
        let user = self.users.create_user(name, email).await?;
        self.users.create_password_account(user.id, &hash).await?;

        info!(user_id = %user.id, "user signed up");

        Ok(())
    }

    /// Exchange a refresh token for a new access token bound to the same
    /// session. The refresh token itself is not rotated.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<String> {
        let found = self
            .sessions
            .find_by_token_with_user(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        let (session, user) = found;

        if session.is_expired(Utc::now()) {
            // Lazy cleanup: the expired session is removed on the spot.
            self.sessions.delete_by_id(session.id).await?;
            return Err(AuthError::RefreshTokenExpired);
        }

        let access_token = self.tokens.issue_access(user.id, &user.email, session.id)?;
        Ok(access_token)
    }

    /// Revoke a session. Idempotent: logging out an absent session succeeds.
    pub async fn logout(&self, session_id: Uuid) -> AuthResult<()> {
        self.sessions.delete_by_id(session_id).await?;
        info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    /// Stateless bearer-token verification.
    pub fn verify(&self, access_token: &str) -> AuthResult<AccessClaims> {
        Ok(self.tokens.verify_access(access_token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::models::session::Session;
    use crate::models::user::{Account, PASSWORD_PROVIDER, User};
    use crate::stores::StoreResult;

    #[derive(Default)]
    struct FakeUserStore {
        users: Mutex<Vec<User>>,
        accounts: Mutex<Vec<Account>>,
    }

    impl FakeUserStore {
        fn with_password_user(email: &str, password: &str) -> (Self, Uuid) {
            let store = Self::default();
            let user_id = store.add_user(email);
            let hash = password::hash_password(password, tiny_params()).unwrap();
            store.add_account(user_id, Some(hash));
            (store, user_id)
        }

        fn add_user(&self, email: &str) -> Uuid {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                is_active: true,
                email_verified: false,
                created_at: now,
                updated_at: now,
            };
            let id = user.id;
            self.users.lock().unwrap().push(user);
            id
        }

        fn add_account(&self, user_id: Uuid, password: Option<String>) {
            let now = Utc::now();
            self.accounts.lock().unwrap().push(Account {
                id: Uuid::new_v4(),
                user_id,
                provider: if password.is_some() {
                    PASSWORD_PROVIDER.to_string()
                } else {
                    "google".to_string()
                },
                password,
                created_at: now,
                updated_at: now,
            });
        }
    }

    #[async_trait]
    impl UserStore for FakeUserStore {
        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_password_account(&self, user_id: Uuid) -> StoreResult<Option<Account>> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.user_id == user_id && a.provider == PASSWORD_PROVIDER)
                .cloned())
        }

        async fn create_user(&self, name: &str, email: &str) -> StoreResult<User> {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                is_active: true,
                email_verified: false,
                created_at: now,
                updated_at: now,
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn create_password_account(
            &self,
            user_id: Uuid,
            password_hash: &str,
        ) -> StoreResult<Account> {
            let now = Utc::now();
            let account = Account {
                id: Uuid::new_v4(),
                user_id,
                provider: PASSWORD_PROVIDER.to_string(),
                password: Some(password_hash.to_string()),
                created_at: now,
                updated_at: now,
            };
            self.accounts.lock().unwrap().push(account.clone());
            Ok(account)
        }
    }

    #[derive(Default)]
    struct FakeSessionStore {
        sessions: Mutex<HashMap<Uuid, Session>>,
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl FakeSessionStore {
        fn register_user(&self, user: User) {
            self.users.lock().unwrap().insert(user.id, user);
        }

        fn backdate(&self, token: &str, expires_at: DateTime<Utc>) {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(session) = sessions.values_mut().find(|s| s.token == token) {
                session.expires_at = expires_at;
            }
        }

        fn len(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SessionStore for FakeSessionStore {
        async fn create_session(
            &self,
            id: Uuid,
            user_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> StoreResult<Session> {
            let now = Utc::now();
            let session = Session {
                id,
                user_id,
                token: token.to_string(),
                expires_at,
                created_at: now,
                updated_at: now,
            };
            self.sessions.lock().unwrap().insert(id, session.clone());
            Ok(session)
        }

        async fn find_by_token_with_user(
            &self,
            token: &str,
        ) -> StoreResult<Option<(Session, User)>> {
            let sessions = self.sessions.lock().unwrap();
            let users = self.users.lock().unwrap();
            Ok(sessions
                .values()
                .find(|s| s.token == token)
                .and_then(|s| users.get(&s.user_id).map(|u| (s.clone(), u.clone()))))
        }

        async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
            self.sessions.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn delete_expired(&self) -> StoreResult<u64> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            let now = Utc::now();
            sessions.retain(|_, s| s.expires_at >= now);
            Ok((before - sessions.len()) as u64)
        }
    }

    fn tiny_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn service(
        users: FakeUserStore,
        sessions: FakeSessionStore,
    ) -> (AuthService, Arc<FakeUserStore>, Arc<FakeSessionStore>) {
        let users = Arc::new(users);
        let sessions = Arc::new(sessions);
        let tokens = TokenService::new("test-secret", 15 * 60, 7 * 24 * 60 * 60);
        let service = AuthService::new(users.clone(), sessions.clone(), tokens, tiny_params());
        (service, users, sessions)
    }

    #[tokio::test]
    async fn sign_in_issues_verifiable_claims_and_persists_session() {
        let (users, user_id) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, sessions) = service(users, FakeSessionStore::default());

        let pair = service.sign_in("alice@example.com", "p4ssw0rd!").await.unwrap();

        let claims = service.verify(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(sessions.len(), 1);
        assert!(
            sessions
                .sessions
                .lock()
                .unwrap()
                .contains_key(&claims.session_id)
        );
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_is_rejected_without_session() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, sessions) = service(users, FakeSessionStore::default());

        let err = service
            .sign_in("alice@example.com", "not-the-password")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(sessions.len(), 0);
    }

    #[tokio::test]
    async fn oauth_only_account_cannot_sign_in_with_password() {
        let users = FakeUserStore::default();
        let user_id = users.add_user("carol@example.com");
        users.add_account(user_id, None);
        let (service, _, sessions) = service(users, FakeSessionStore::default());

        let err = service
            .sign_in("carol@example.com", "whatever")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(sessions.len(), 0);
    }

    #[tokio::test]
    async fn credential_failures_share_one_message() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, _) = service(users, FakeSessionStore::default());

        let unknown = service
            .sign_in("nobody@example.com", "p4ssw0rd!")
            .await
            .unwrap_err();
        let wrong = service
            .sign_in("alice@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, _) = service(users, FakeSessionStore::default());

        let err = service
            .sign_up("alice@example.com", "another-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trips() {
        let (service, _, _) = service(FakeUserStore::default(), FakeSessionStore::default());

        service.sign_up("bob@example.com", "s3cret-pass").await.unwrap();
        let pair = service.sign_in("bob@example.com", "s3cret-pass").await.unwrap();

        let claims = service.verify(&pair.access_token).unwrap();
        assert_eq!(claims.email, "bob@example.com");
    }

    #[tokio::test]
    async fn refresh_with_valid_session_keeps_the_session_id() {
        let (users, user_id) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let sessions = FakeSessionStore::default();
        sessions.register_user(users.users.lock().unwrap()[0].clone());
        let (service, _, _) = service(users, sessions);

        let pair = service.sign_in("alice@example.com", "p4ssw0rd!").await.unwrap();
        let original = service.verify(&pair.access_token).unwrap();

        let refreshed = service
            .refresh_access_token(&pair.refresh_token)
            .await
            .unwrap();
        let claims = service.verify(&refreshed).unwrap();

        assert_eq!(claims.session_id, original.session_id);
        assert_eq!(claims.user_id, user_id);
    }

    #[tokio::test]
    async fn refresh_with_unknown_token_is_rejected() {
        let (service, _, _) = service(FakeUserStore::default(), FakeSessionStore::default());

        let err = service
            .refresh_access_token("no-such-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn refresh_with_expired_session_deletes_it() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let sessions = FakeSessionStore::default();
        sessions.register_user(users.users.lock().unwrap()[0].clone());
        let (service, _, sessions) = service(users, sessions);

        let pair = service.sign_in("alice@example.com", "p4ssw0rd!").await.unwrap();
        sessions.backdate(&pair.refresh_token, Utc::now() - Duration::hours(1));

        let err = service
            .refresh_access_token(&pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));

        // The lazy cleanup removed the row; a second attempt no longer finds it.
        let err = service
            .refresh_access_token(&pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
        assert_eq!(sessions.len(), 0);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, sessions) = service(users, FakeSessionStore::default());

        let pair = service.sign_in("alice@example.com", "p4ssw0rd!").await.unwrap();
        let claims = service.verify(&pair.access_token).unwrap();

        service.logout(claims.session_id).await.unwrap();
        assert_eq!(sessions.len(), 0);
        service.logout(claims.session_id).await.unwrap();
    }

    #[tokio::test]
    async fn access_token_stays_valid_after_logout_until_expiry() {
        let (users, _) = FakeUserStore::with_password_user("alice@example.com", "p4ssw0rd!");
        let (service, _, _) = service(users, FakeSessionStore::default());

        let pair = service.sign_in("alice@example.com", "p4ssw0rd!").await.unwrap();
        let claims = service.verify(&pair.access_token).unwrap();
        service.logout(claims.session_id).await.unwrap();

        // Stateless verification: the short TTL bounds this window.
        assert!(service.verify(&pair.access_token).is_ok());
    }
}
