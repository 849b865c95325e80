//! jpg2pdf-core – the conversion pipeline behind the jpg2pdf service.
//!
//! The crate knows nothing about HTTP or databases. It provides:
//!
//! - [`ConversionKind`]: the fixed set of conversions a client may request
//!   and the routine each one dispatches to.
//! - [`ConversionJob`]: the job record and its lifecycle state machine.
//! - [`UploadPolicy`]: extension / content / size validation of uploads.
//! - [`naming`]: deterministic names for stored uploads and outputs.
//! - [`convert()`]: the synchronous image-to-PDF, resize and compress routines.

pub mod convert;
pub mod error;
pub mod job;
pub mod kind;
pub mod naming;
pub mod validate;

pub use convert::convert;
pub use error::{ConvertError, JobError, ValidationError};
pub use job::{ConversionJob, JobStatus};
pub use kind::{ConversionKind, Routine};
pub use validate::{SniffedType, UploadPolicy};
