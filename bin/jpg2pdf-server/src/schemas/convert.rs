//! Upload, status and download payloads.

use chrono::{DateTime, Utc};
use jpg2pdf_core::{ConversionJob, ConversionKind, JobStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart body of `POST /upload/` (documentation only; the handler reads
/// the fields one by one).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// JPG, PNG, GIF, BMP, WebP or PDF file.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// One of `jpg_to_pdf` (default), `png_to_pdf`, `pdf_to_jpg`,
    /// `resize_image`, `compress_image`.
    pub conversion_type: Option<String>,
}

/// Response body for a completed `POST /upload/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub job_id: Uuid,
    /// Relative URL of the converted file.
    pub download_url: String,
    pub original_filename: String,
    pub converted_filename: Option<String>,
}

impl From<&ConversionJob> for UploadResponse {
    fn from(job: &ConversionJob) -> Self {
        Self {
            success: true,
            job_id: job.id,
            download_url: format!("/download/{}/", job.id),
            original_filename: job.original_filename.clone(),
            converted_filename: job.converted_filename.clone(),
        }
    }
}

/// Response body for `GET /status/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    pub id: Uuid,
    #[schema(value_type = String, example = "jpg_to_pdf")]
    pub conversion_type: ConversionKind,
    /// `pending`, `processing`, `completed` or `failed`.
    #[schema(value_type = String, example = "completed")]
    pub status: JobStatus,
    pub original_filename: String,
    pub converted_filename: Option<String>,
    /// Upload size in bytes.
    pub file_size: u64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ConversionJob> for JobStatusResponse {
    fn from(job: ConversionJob) -> Self {
        Self {
            id: job.id,
            conversion_type: job.conversion_type,
            status: job.status,
            original_filename: job.original_filename,
            converted_filename: job.converted_filename,
            file_size: job.file_size,
            error_message: job.error_message,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}
