use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::session::Session;

pub async fn insert_session(pool: &PgPool, session: &Session) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions \
            (id, user_id, refresh_token, expires_at, created_at, user_agent, ip_address, revoked) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.refresh_token)
    .bind(session.expires_at)
    .bind(session.created_at)
    .bind(&session.user_agent)
    .bind(&session.ip_address)
    .bind(session.revoked)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn find_session_by_id(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT id, user_id, refresh_token, expires_at, created_at, user_agent, ip_address, \
         revoked FROM sessions WHERE id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_session(pool: &PgPool, session_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Marks a session revoked. The row stays behind as an audit trail; only
/// rotation and the expiry sweep delete rows.
pub async fn revoke_session(pool: &PgPool, session_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE sessions SET revoked = TRUE WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces a consumed session with its successor in one transaction, so a
/// concurrent refresh of the same token cannot observe a half-rotated state:
/// exactly one caller finds the old row.
pub async fn rotate_session(
    pool: &PgPool,
    old_session_id: &str,
    replacement: &Session,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(old_session_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO sessions \
            (id, user_id, refresh_token, expires_at, created_at, user_agent, ip_address, revoked) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&replacement.id)
    .bind(&replacement.user_id)
    .bind(&replacement.refresh_token)
    .bind(replacement.expires_at)
    .bind(replacement.created_at)
    .bind(&replacement.user_agent)
    .bind(&replacement.ip_address)
    .bind(replacement.revoked)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Deletes every session past its expiry. Idempotent; returns the number of
/// rows removed.
pub async fn cleanup_expired_sessions(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
