//! Access and refresh token issuance and verification.
//!
//! Both token kinds are HS256-signed JWTs, but they are signed with distinct
//! secrets so a leaked refresh secret cannot mint access tokens and vice
//! versa. Refresh tokens additionally carry the session id they are bound to.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Owning user id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Owning user id.
    pub sub: String,
    /// Session the token is bound to; rotation retires it.
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_access_token(
    user_id: &str,
    secret: &str,
    expiration_minutes: u64,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::minutes(expiration_minutes as i64)).timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn create_refresh_token(
    user_id: &str,
    session_id: &str,
    secret: &str,
    expiration_days: u64,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        exp: (now + Duration::days(expiration_days as i64)).timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

/// Returns the claims when the token is authentic and unexpired, `None`
/// otherwise. A bad signature, expired token, or garbage input are all the
/// same to callers: the request is unauthenticated.
pub fn verify_access_token(token: &str, secret: &str) -> Option<AccessTokenClaims> {
    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn verify_refresh_token(token: &str, secret: &str) -> Option<RefreshTokenClaims> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}
