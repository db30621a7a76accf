//! Models for refresh-token sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a refresh-token session.
///
/// A session is created on sign-in or refresh and only ever leaves the
/// active state by being revoked (sign-out) or deleted (rotation, cleanup).
pub struct Session {
    /// Unique identifier, embedded in the refresh token as `sid`.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// The refresh token exactly as issued; refresh requires an exact match.
    pub refresh_token: String,
    /// Hard expiry; rows past this point are swept by cleanup.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Client metadata captured at issuance.
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    /// Set on sign-out; the row is kept as an audit trail.
    pub revoked: bool,
}

impl Session {
    /// The id is caller-supplied because the refresh token embedding it is
    /// minted before the row exists.
    pub fn new(
        id: String,
        user_id: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            refresh_token,
            expires_at,
            created_at: Utc::now(),
            user_agent,
            ip_address,
            revoked: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
