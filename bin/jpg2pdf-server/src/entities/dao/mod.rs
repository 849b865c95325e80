pub mod contact;
pub mod job;

pub use contact::ContactMessage;
pub use job::{ExpiredJob, JobRow};
