//! Daily retention job for the date-partitioned history logs.

use std::time::Duration;

use tracing::{error, info};

use crate::AppState;

pub fn start_retention_job(state: AppState) {
    tokio::spawn(async move {
        let retain = state.settings.retention_partitions;
        info!("starting history retention job (keeping {} partitions)", retain);

        // first tick fires immediately, so stale partitions go on startup too
        let mut interval = tokio::time::interval(Duration::from_secs(86400));
        loop {
            interval.tick().await;
            match state.history.prune_partitions(retain) {
                Ok(0) => {}
                Ok(removed) => info!("pruned {} history partitions", removed),
                Err(e) => error!("history retention failed: {}", e),
            }
        }
    });
}
