use jpg2pdf_core::ConversionJob;
use uuid::Uuid;

use crate::entities::parse_timestamp;

/// A row in the `conversion_jobs` table, as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: String,
    pub conversion_type: String,
    pub status: String,
    pub original_filename: String,
    pub converted_filename: Option<String>,
    pub file_size: i64,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
}

/// The columns the retention sweep needs. Read as plain text so a row that
/// no longer decodes into a [`ConversionJob`] is still purged.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ExpiredJob {
    pub id: String,
    pub converted_filename: Option<String>,
}

impl TryFrom<JobRow> for ConversionJob {
    type Error = sqlx::Error;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let decode = |e: Box<dyn std::error::Error + Send + Sync>| sqlx::Error::Decode(e);
        Ok(ConversionJob {
            id: Uuid::parse_str(&row.id).map_err(|e| decode(Box::new(e)))?,
            conversion_type: row
                .conversion_type
                .parse()
                .map_err(|e: strum::ParseError| decode(Box::new(e)))?,
            status: row
                .status
                .parse()
                .map_err(|e: strum::ParseError| decode(Box::new(e)))?,
            original_filename: row.original_filename,
            converted_filename: row.converted_filename,
            file_size: u64::try_from(row.file_size).unwrap_or_default(),
            created_at: parse_timestamp(&row.created_at)?,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
            error_message: row.error_message,
        })
    }
}
