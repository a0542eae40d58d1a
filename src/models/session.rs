//! Server-side sessions backing refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One login session.
///
/// The id is embedded in both issued tokens as a correlation key; the stored
/// `token` is the refresh-token material. Deleting the row is the revocation
/// mechanism — there is no separate blacklist.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Refresh token issued for this session, stored so it can be looked up
    /// and invalidated.
    #[serde(skip_serializing)]
    pub token: String,

    /// The session is valid iff `now < expires_at`. Expired rows are lazily
    /// deleted on refresh attempts.
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
