//! Retention sweep: purges jobs older than the retention window together
//! with their files.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use tracing::{info, warn};

use crate::entities::JobStore;
use crate::media::MediaRoot;
use crate::state::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub jobs_removed: usize,
    pub files_removed: usize,
    /// File or record deletions that failed; the sweep carried on past them.
    pub failures: usize,
}

/// Delete every job created before `now - retention`, including rows that
/// no longer decode into a job.
///
/// Only listing the expired jobs can fail the sweep as a whole. File
/// removal is best-effort and a record that cannot be deleted is counted
/// and skipped. A retention reaching past the earliest representable time
/// expires nothing.
pub async fn sweep<S: JobStore>(
    store: &S,
    media: &MediaRoot,
    retention: chrono::Duration,
    now: DateTime<Utc>,
) -> Result<CleanupReport, sqlx::Error> {
    let mut report = CleanupReport::default();
    let Some(cutoff) = now.checked_sub_signed(retention) else {
        info!(?retention, "retention exceeds the time range; nothing expires");
        return Ok(report);
    };
    let expired = store.list_jobs_created_before(cutoff).await?;

    for job in &expired {
        let files = media
            .remove_job_files(&job.id, job.converted_filename.as_deref())
            .await;
        report.files_removed += files.removed;
        report.failures += files.failed;

        match store.delete_job_row(&job.id).await {
            Ok(true) => report.jobs_removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "failed to delete expired job");
                report.failures += 1;
            }
        }
    }

    info!(
        cutoff = %cutoff,
        jobs_removed = report.jobs_removed,
        files_removed = report.files_removed,
        failures = report.failures,
        "cleanup sweep finished"
    );
    Ok(report)
}

/// Run [`sweep`] every `cleanup_interval_secs`, starting immediately.
/// Returns `None` when the interval is `0`.
pub fn spawn_periodic(state: Arc<AppState>) -> Option<AbortHandle> {
    let secs = state.config.cleanup_interval_secs;
    if secs == 0 {
        info!("periodic cleanup disabled");
        return None;
    }

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let result = sweep(
                state.store.as_ref(),
                &state.media,
                state.config.retention(),
                Utc::now(),
            )
            .await;
            if let Err(e) = result {
                warn!(error = %e, "cleanup sweep failed");
            }
        }
    });
    Some(task.abort_handle())
}
