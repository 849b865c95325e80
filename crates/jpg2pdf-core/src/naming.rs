//! Deterministic on-disk names, keyed by job id.
//!
//! The client-supplied file name never becomes part of a path; only its
//! validated, lowercased extension does.

use uuid::Uuid;

/// Every stored upload of a job starts with this prefix.
pub fn upload_prefix(job_id: impl std::fmt::Display) -> String {
    format!("{job_id}_")
}

/// `{job_id}_{8 hex}{ext}`, e.g. `…_3fa85f64.png`.
pub fn upload_file_name(job_id: Uuid, extension: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", upload_prefix(job_id), &nonce[..8], extension)
}

pub fn pdf_output(job_id: Uuid) -> String {
    format!("{job_id}_converted.pdf")
}

/// `extension` without the dot: `"jpg"` or `"png"`.
pub fn resized_output(job_id: Uuid, extension: &str) -> String {
    format!("{job_id}_resized.{extension}")
}

pub fn compressed_output(job_id: Uuid) -> String {
    format!("{job_id}_compressed.jpg")
}
