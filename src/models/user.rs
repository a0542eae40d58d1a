//! Principals and their credential accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An authenticated principal.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Display name. Derived from the email local part at registration.
    pub name: String,

    /// Unique login email.
    pub email: String,

    pub is_active: bool,
    pub email_verified: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A credential attached to a user.
///
/// Password principals carry an argon2id hash; accounts created through an
/// external identity provider have none, and cannot sign in with a password.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Credential provider, e.g. `credential` for password accounts.
    pub provider: String,

    /// Argon2id password hash. `None` for provider-backed accounts.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider tag used for password-backed accounts.
pub const PASSWORD_PROVIDER: &str = "credential";
