//! Scheduled cleanup of dead refresh-token rows and idle rate-limit buckets.

use crate::db::Database;
use crate::rate_limit::LoginRateLimit;
use std::time::Duration;
use tracing::{debug, error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database, login_limit: &LoginRateLimit) {
    match db.tokens().delete_stale().await {
        Ok(count) if count > 0 => info!(count, "Cleaned up stale refresh tokens"),
        Ok(_) => {}
        Err(e) => error!(error = %e, "Failed to clean up refresh tokens"),
    }

    let tracked = login_limit.prune();
    debug!(tracked, "Pruned login rate limiter");
}

/// Spawn a background task that runs cleanup periodically.
/// The first tick fires immediately, so cleanup also runs at startup.
pub fn spawn_cleanup_scheduler(
    db: Database,
    login_limit: LoginRateLimit,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db, &login_limit).await;
        }
    })
}
