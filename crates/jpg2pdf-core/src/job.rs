//! The conversion job record and its lifecycle.
//!
//! ```text
//! pending ──start──▶ processing ──complete──▶ completed
//!    │                    │
//!    └───────fail─────────┴──────fail───────▶ failed
//! ```
//!
//! Once a job is terminal, exactly one of {`converted_filename` +
//! `completed_at`} or {`error_message`} is set. The transition methods are
//! the only way to reach a terminal state, so the invariant holds for every
//! job built through them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::JobError;
use crate::kind::ConversionKind;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub id: Uuid,
    pub conversion_type: ConversionKind,
    pub status: JobStatus,
    pub original_filename: String,
    pub converted_filename: Option<String>,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ConversionJob {
    /// A fresh pending job with a random id.
    pub fn new(
        conversion_type: ConversionKind,
        original_filename: impl Into<String>,
        file_size: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversion_type,
            status: JobStatus::Pending,
            original_filename: original_filename.into(),
            converted_filename: None,
            file_size,
            created_at: now,
            completed_at: None,
            error_message: None,
        }
    }

    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Processing, &[JobStatus::Pending])
    }

    pub fn complete(
        &mut self,
        converted_filename: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), JobError> {
        self.transition(JobStatus::Completed, &[JobStatus::Processing])?;
        self.converted_filename = Some(converted_filename.into());
        self.completed_at = Some(now);
        self.error_message = None;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(
            JobStatus::Failed,
            &[JobStatus::Pending, JobStatus::Processing],
        )?;
        self.converted_filename = None;
        self.completed_at = None;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// `true` when the job was created before `now - retention`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.created_at < now - retention
    }

    pub fn is_downloadable(&self) -> bool {
        self.status == JobStatus::Completed && self.converted_filename.is_some()
    }

    fn transition(&mut self, to: JobStatus, allowed_from: &[JobStatus]) -> Result<(), JobError> {
        if !allowed_from.contains(&self.status) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
