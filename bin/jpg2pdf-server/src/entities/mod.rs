//! Persistence layer.
//!
//! [`JobStore`] and [`ContactStore`] define what the handlers need from the
//! database; [`SqliteStore`] implements both. To swap to another database,
//! implement the traits for a new type and change the concrete type in
//! [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod contact;
pub mod dao;
pub mod job;

pub use contact::ContactStore;
pub use dao::{ContactMessage, ExpiredJob};
pub use job::JobStore;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// SQLite-backed store for jobs and contact messages.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://jpg2pdf.db"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrate(pool).await
    }

    /// A private in-memory database. Pinned to a single connection that
    /// never expires, since every SQLite `:memory:` connection is its own
    /// database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(pool).await
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

/// Fixed-width RFC 3339 so that text order equals time order in SQL.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
