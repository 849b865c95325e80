//! Error types for jpg2pdf-core.
//!
//! Three failure families, one enum each:
//!
//! * [`ValidationError`] – the upload is refused before a job exists.
//! * [`ConvertError`] – a conversion routine failed; the job is marked failed
//!   and the message is shown to the user.
//! * [`JobError`] – a caller tried to move a job outside its lifecycle.

use thiserror::Error;

use crate::job::JobStatus;
use crate::kind::ConversionKind;

/// Upload rejected by [`crate::UploadPolicy`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No file part, or the file part was empty.
    #[error("No file uploaded")]
    Missing,

    /// The upload exceeds the configured size cap.
    #[error("File too large. Maximum size is {limit_mb}MB.")]
    TooLarge { size: u64, limit_mb: u64 },

    /// Extension outside the allow-list.
    #[error("Unsupported file type. Please upload JPG, PNG, GIF, BMP, WebP or PDF files.")]
    Extension { extension: Option<String> },

    /// Sniffed content type outside the allow-list.
    #[error("Unsupported file type. Please upload JPG, PNG, GIF, BMP, WebP or PDF files.")]
    Content { detected: Option<&'static str> },

    /// The `conversion_type` field named no known conversion.
    #[error("Unsupported conversion type: {0}")]
    UnknownKind(String),
}

/// A conversion routine failed.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The requested kind has no conversion routine.
    #[error("Unsupported conversion type: {0}")]
    Unsupported(ConversionKind),

    #[error("{0}")]
    Image(#[from] image::ImageError),

    #[error("{0}")]
    Pdf(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Context wrapper naming the routine that failed.
    #[error("Failed to {action}: {source}")]
    Routine {
        action: &'static str,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    pub(crate) fn during(action: &'static str) -> impl FnOnce(ConvertError) -> ConvertError {
        move |source| ConvertError::Routine {
            action,
            source: Box::new(source),
        }
    }
}

/// Illegal job lifecycle transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
