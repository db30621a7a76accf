//! Models that represent user accounts and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a registered user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: String,
    /// Display name chosen at sign-up.
    pub name: String,
    /// Unique email used for login (matched case-sensitively).
    pub email: String,
    /// Argon2 hash of the user's password. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new user with a freshly generated identifier.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Payload for `POST /api/v1/auth/sign-up`.
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(
        length(min = 5, message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload for `POST /api/v1/auth/sign-in`.
pub struct SignInRequest {
    #[validate(
        length(min = 5, message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
/// Envelope wrapping a single user, returned by sign-up and user lookups.
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Successful sign-in: public user view plus a short-lived access token.
/// The refresh token travels separately in an HTTP-only cookie.
pub struct SignInResponse {
    pub user: UserResponse,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Successful refresh: a fresh access token. The rotated refresh token is
/// set on the cookie, never in the body.
pub struct RefreshResponse {
    pub access_token: String,
}
