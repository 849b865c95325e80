use std::future::Future;

use chrono::{DateTime, Utc};
use jpg2pdf_core::ConversionJob;
use uuid::Uuid;

use crate::entities::dao::{ExpiredJob, JobRow};
use crate::entities::{format_timestamp, SqliteStore};

const JOB_COLUMNS: &str = "id, conversion_type, status, original_filename, converted_filename, \
                           file_size, created_at, completed_at, error_message";

pub trait JobStore: Send + Sync + 'static {
    fn insert_job(
        &self,
        job: &ConversionJob,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Persist the lifecycle fields (status, output name, completion time,
    /// error) together so a reader never sees a half-applied transition.
    fn save_job_state(
        &self,
        job: &ConversionJob,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn get_job(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<ConversionJob>, sqlx::Error>> + Send;

    /// Returns `true` when a row was deleted.
    fn delete_job(&self, id: Uuid) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Delete by the stored id text, which need not be a valid UUID.
    fn delete_job_row(&self, id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Jobs created strictly before `cutoff`, newest first. Rows are not
    /// decoded, so malformed ones are listed too.
    fn list_jobs_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ExpiredJob>, sqlx::Error>> + Send;
}

impl JobStore for SqliteStore {
    async fn insert_job(&self, job: &ConversionJob) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO conversion_jobs (id, conversion_type, status, original_filename, \
             converted_filename, file_size, created_at, completed_at, error_message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(job.id.to_string())
        .bind(job.conversion_type.as_ref())
        .bind(job.status.as_ref())
        .bind(&job.original_filename)
        .bind(&job.converted_filename)
        .bind(i64::try_from(job.file_size).unwrap_or(i64::MAX))
        .bind(format_timestamp(job.created_at))
        .bind(job.completed_at.map(format_timestamp))
        .bind(&job.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_job_state(&self, job: &ConversionJob) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE conversion_jobs \
             SET status = ?1, converted_filename = ?2, completed_at = ?3, error_message = ?4 \
             WHERE id = ?5",
        )
        .bind(job.status.as_ref())
        .bind(&job.converted_filename)
        .bind(job.completed_at.map(format_timestamp))
        .bind(&job.error_message)
        .bind(job.id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ConversionJob>, sqlx::Error> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM conversion_jobs WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(ConversionJob::try_from).transpose()
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.delete_job_row(&id.to_string()).await
    }

    async fn delete_job_row(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM conversion_jobs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_jobs_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExpiredJob>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, converted_filename FROM conversion_jobs WHERE created_at < ?1 \
             ORDER BY created_at DESC",
        )
        .bind(format_timestamp(cutoff))
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;
    use jpg2pdf_core::{ConversionKind, JobStatus};

    async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_a_pending_job() {
        let store = store().await;
        let job = ConversionJob::new(ConversionKind::PngToPdf, "scan.png", 512, Utc::now());
        store.insert_job(&job).await.unwrap();

        let loaded = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.status, JobStatus::Pending);
        assert_eq!(loaded.conversion_type, ConversionKind::PngToPdf);
        assert_eq!(loaded.original_filename, "scan.png");
        assert_eq!(loaded.file_size, 512);
        assert!(store.get_job(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_job_state_persists_transitions() {
        let store = store().await;
        let mut job = ConversionJob::new(ConversionKind::CompressImage, "a.jpg", 1, Utc::now());
        store.insert_job(&job).await.unwrap();

        job.start().unwrap();
        store.save_job_state(&job).await.unwrap();
        assert_eq!(store.get_job(job.id).await.unwrap().unwrap().status, JobStatus::Processing);

        job.fail("Failed to compress image: truncated").unwrap();
        store.save_job_state(&job).await.unwrap();
        let loaded = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("Failed to compress image: truncated"));
        assert!(loaded.converted_filename.is_none() && loaded.completed_at.is_none());
    }

    #[tokio::test]
    async fn saving_an_unknown_job_is_an_error() {
        let store = store().await;
        let job = ConversionJob::new(ConversionKind::JpgToPdf, "a.jpg", 1, Utc::now());
        assert!(matches!(store.save_job_state(&job).await, Err(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn lists_only_jobs_older_than_cutoff() {
        let store = store().await;
        let now = Utc::now();
        let old = ConversionJob::new(ConversionKind::JpgToPdf, "old.jpg", 1, now - Duration::hours(30));
        let fresh = ConversionJob::new(ConversionKind::JpgToPdf, "new.jpg", 1, now - Duration::hours(1));
        store.insert_job(&old).await.unwrap();
        store.insert_job(&fresh).await.unwrap();

        let expired = store
            .list_jobs_created_before(now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(
            expired,
            vec![ExpiredJob { id: old.id.to_string(), converted_filename: None }]
        );

        assert!(store.delete_job(old.id).await.unwrap());
        assert!(!store.delete_job(old.id).await.unwrap());
    }

    #[tokio::test]
    async fn undecodable_rows_are_still_listed_and_deletable() {
        let store = store().await;
        let created = format_timestamp(Utc::now() - Duration::hours(48));
        sqlx::query(
            "INSERT INTO conversion_jobs (id, conversion_type, status, original_filename, \
             converted_filename, created_at) VALUES ('legacy-1', 'pdf_to_docx', 'completed', \
             'a.pdf', 'legacy-1.docx', ?1)",
        )
        .bind(&created)
        .execute(store.pool())
        .await
        .unwrap();

        let expired = store.list_jobs_created_before(Utc::now()).await.unwrap();
        assert_eq!(
            expired,
            vec![ExpiredJob {
                id: "legacy-1".into(),
                converted_filename: Some("legacy-1.docx".into()),
            }]
        );
        assert!(store.delete_job_row("legacy-1").await.unwrap());
        assert!(store.list_jobs_created_before(Utc::now()).await.unwrap().is_empty());
    }
}
