//! Session persistence. Deleting a row is the revocation mechanism.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use super::StoreResult;
use crate::models::{session::Session, user::User};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session>;

    /// Look a session up by its refresh token, together with its user.
    async fn find_by_token_with_user(&self, token: &str) -> StoreResult<Option<(Session, User)>>;

    /// Idempotent: deleting an absent session is not an error.
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()>;

    /// Sweep sessions past their expiry. Returns the number removed.
    async fn delete_expired(&self) -> StoreResult<u64>;
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Arc<SqlitePool>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session> {
        let now = Utc::now();
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, token, expires_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, user_id, token, expires_at, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        Ok(session)
    }

    async fn find_by_token_with_user(&self, token: &str) -> StoreResult<Option<(Session, User)>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, token, expires_at, created_at, updated_at
             FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, is_active, email_verified, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(session.user_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(user.map(|user| (session, user)))
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
