//! Periodic cleanup of old terminal command jobs.
//!
//! Deletes `completed`, `failed` and `cancelled` rows whose `executed_at` is
//! older than the retention period. Pending and in-progress jobs are never
//! touched. Waiters must already tolerate a job vanishing once terminal.

use std::sync::Arc;

use chrono::Utc;
use courier_db::store::JobStore;
use tokio_util::sync::CancellationToken;

use crate::config::RetentionConfig;

/// Run the retention loop until `cancel` is triggered.
pub async fn run(store: Arc<dyn JobStore>, config: RetentionConfig, cancel: CancellationToken) {
    tracing::info!(
        retention_hours = config.retention.num_hours(),
        interval_secs = config.interval.as_secs(),
        "Command retention job started"
    );

    let mut interval = tokio::time::interval(config.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Command retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(store.as_ref(), config.retention).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Command retention: purged old rows");
                    }
                    Ok(_) => {
                        tracing::debug!("Command retention: no rows to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Command retention: cleanup failed");
                    }
                }
            }
        }
    }
}

/// Delete terminal jobs executed more than `retention` ago.
pub async fn sweep_once(
    store: &dyn JobStore,
    retention: chrono::Duration,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - retention;
    store.delete_terminal_before(cutoff).await
}
