//! Periodic removal of expired login sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::session::SessionStore;

/// Purge expired sessions every `every` until `cancel` fires.
pub async fn run(store: Arc<SessionStore>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Session purge job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session purge job stopping");
                break;
            }
            _ = interval.tick() => {
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::info!(purged, "Session purge: dropped expired sessions");
                } else {
                    tracing::debug!("Session purge: nothing to drop");
                }
            }
        }
    }
}
