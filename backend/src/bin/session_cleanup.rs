//! One-shot expired-session sweep for cron or manual runs.

use chrono::Utc;
use gatekeeper_backend::{
    config::Config, db::connection::create_pool, repositories::session as session_repo,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let deleted = session_repo::cleanup_expired_sessions(&pool, Utc::now()).await?;
    if deleted > 0 {
        tracing::info!("Deleted {} expired sessions", deleted);
    }

    sqlx::query("VACUUM (ANALYZE) sessions")
        .execute(&pool)
        .await?;

    Ok(())
}
