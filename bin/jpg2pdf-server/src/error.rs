//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a `{"success": false, "error": "..."}` body with an appropriate status.
//!
//! Validation and conversion messages are meant for the user and are returned
//! as-is. Database, template and other internal errors are logged with full
//! detail but only a generic message reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jpg2pdf_core::{JobError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned when the upload could not be written to disk.
pub const STORAGE_MESSAGE: &str = "Failed to save uploaded file";

/// All errors that can occur in the jpg2pdf-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The upload was refused before a job was created.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The conversion routine failed; the job is already marked failed.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// The upload could not be persisted; the job has been rolled back.
    #[error("storage error: {0}")]
    Storage(String),

    /// Propagated from the SQLite store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Page rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Conversion(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),

            ServerError::Storage(m) => {
                error!(error = %m, "failed to store upload");
                (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_MESSAGE.to_owned())
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Template(e) => {
                error!(error = ?e, "template error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (
            status,
            Json(json!({ "success": false, "error": client_message })),
        )
            .into_response()
    }
}

impl From<JobError> for ServerError {
    fn from(e: JobError) -> Self {
        ServerError::Internal(e.to_string())
    }
}
