//! Principal and credential persistence.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use super::StoreResult;
use crate::models::user::{Account, PASSWORD_PROVIDER, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// The password credential for a user, if one exists. Provider-backed
    /// accounts have none.
    async fn find_password_account(&self, user_id: Uuid) -> StoreResult<Option<Account>>;

    async fn create_user(&self, name: &str, email: &str) -> StoreResult<User>;

    async fn create_password_account(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> StoreResult<Account>;
}

#[derive(Clone)]
pub struct SqliteUserStore {
    db: Arc<SqlitePool>,
}

impl SqliteUserStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, is_active, email_verified, created_at, updated_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&*self.db)
        .await
        .map_err(Into::into)
    }

    async fn find_password_account(&self, user_id: Uuid) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT id, user_id, provider, password, created_at, updated_at
             FROM accounts WHERE user_id = ? AND provider = ?",
        )
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .fetch_optional(&*self.db)
        .await
        .map_err(Into::into)
    }

    async fn create_user(&self, name: &str, email: &str) -> StoreResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, is_active, email_verified, created_at, updated_at)
             VALUES (?, ?, ?, 1, 0, ?, ?)
             RETURNING id, name, email, is_active, email_verified, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        Ok(user)
    }

    async fn create_password_account(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> StoreResult<Account> {
        let now = Utc::now();
        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, user_id, provider, password, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, user_id, provider, password, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        Ok(account)
    }
}
