//! Periodic deletion of expired sessions.
//!
//! Spawned from `main` on its own task so sweeps never block request
//! handling. The first tick fires immediately, which doubles as the
//! sweep-on-startup pass.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use crate::repositories::session as session_repo;

/// How often the cleanup job runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

pub async fn run(pool: PgPool) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Session cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        interval.tick().await;
        sweep(&pool).await;
    }
}

/// One cleanup pass. Errors are logged, never propagated: a failed sweep
/// retries on the next tick.
pub async fn sweep(pool: &PgPool) {
    match session_repo::cleanup_expired_sessions(pool, Utc::now()).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(deleted, "Session cleanup: purged expired sessions");
            } else {
                tracing::debug!("Session cleanup: nothing to purge");
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "Session cleanup failed");
        }
    }
}
