//! Retention service for time-based report purge.
//!
//! Runs as a background task deleting reports older than `retention_days`.
//! A retention of zero days disables the purge.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::report_repo::ReportRepo;
use crate::Result;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the retention purge background task.
///
/// Returns `None` when `retention_days` is zero.
#[must_use]
pub fn spawn_retention_task(
    repo: ReportRepo,
    retention_days: u32,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if retention_days == 0 {
        info!("report retention disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = purge(&repo, retention_days).await {
                        error!(%err, "retention purge failed");
                    }
                }
            }
        }
    }))
}

/// Delete reports older than `retention_days` and return how many went.
///
/// # Errors
///
/// Returns `AppError::Db` if the delete fails.
pub async fn purge(repo: &ReportRepo, retention_days: u32) -> Result<u64> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
    let deleted = repo.purge_before(cutoff).await?;
    info!(retention_days, deleted, "retention purge completed");
    Ok(deleted)
}
