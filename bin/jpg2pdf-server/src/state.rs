//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::media::MediaRoot;
use crate::routes::pages::Pages;

/// State shared across all HTTP handlers and the cleanup task.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Job records and contact messages.
    pub store: Arc<SqliteStore>,
    /// Uploaded and converted files.
    pub media: Arc<MediaRoot>,
    /// Compiled page templates.
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(config: Config, store: SqliteStore) -> Result<Self, minijinja::Error> {
        let media = MediaRoot::new(config.media_root.clone());
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            media: Arc::new(media),
            pages: Arc::new(Pages::load()?),
        })
    }
}
