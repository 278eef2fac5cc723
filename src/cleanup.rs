//! Optional sweep of unusable refresh tokens.
//!
//! Lookups already ignore expired and revoked rows; the sweep only bounds
//! table growth.

use crate::db::Database;
use crate::jwt;
use std::time::Duration;
use tracing::{error, info};

/// Delete expired and revoked refresh tokens once.
pub async fn run_cleanup(db: &Database) {
    match db.refresh_tokens().delete_unusable(jwt::now()).await {
        Ok(count) if count > 0 => info!("Cleaned up {} unusable refresh tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up refresh tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup every `interval`, the first run
/// happening immediately. Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_cleanup_keeps_usable_tokens() {
        let db = Database::open(":memory:").await.unwrap();
        let user = Uuid::new_v4();
        db.users()
            .create(user, "sweep@example.com", "hash", 0)
            .await
            .unwrap();

        let now = jwt::now();
        let store = db.refresh_tokens();
        store.create("live", user, now, now + 600).await.unwrap();
        store.create("expired", user, now - 600, now - 1).await.unwrap();
        store.create("revoked", user, now, now + 600).await.unwrap();
        assert!(store.revoke("revoked", now).await.unwrap());

        run_cleanup(&db).await;

        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("expired").await.unwrap().is_none());
        assert!(store.get("revoked").await.unwrap().is_none());
    }
}
