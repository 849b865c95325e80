use std::future::Future;

use crate::entities::dao::ContactMessage;
use crate::entities::{format_timestamp, SqliteStore};

pub trait ContactStore: Send + Sync + 'static {
    fn insert_contact_message(
        &self,
        message: &ContactMessage,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    #[cfg(test)]
    fn count_contact_messages(&self) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl ContactStore for SqliteStore {
    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO contact_messages (id, inquiry_type, name, email, subject, message, \
             remote_addr, user_agent, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(message.id.to_string())
        .bind(&message.inquiry_type)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(&message.remote_addr)
        .bind(&message.user_agent)
        .bind(format_timestamp(message.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[cfg(test)]
    async fn count_contact_messages(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
