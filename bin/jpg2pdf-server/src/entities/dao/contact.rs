use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A row in the `contact_messages` table.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub id: Uuid,
    pub inquiry_type: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
