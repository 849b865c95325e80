//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;

use jpg2pdf_core::UploadPolicy;

const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Runtime configuration for jpg2pdf-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// SQLite database URL (default: `"sqlite://jpg2pdf.db"`). The file is
    /// created if it does not exist.
    pub database_url: String,

    /// Directory holding `uploads/` and `converted/`.
    pub media_root: PathBuf,

    /// Upload size cap in MiB.
    pub max_upload_mb: u64,

    /// Sniff upload content in addition to checking the extension.
    pub sniff_content: bool,

    /// Jobs older than this are purged by the cleanup sweep.
    pub retention_hours: i64,

    /// Seconds between background cleanup sweeps; `0` disables them.
    pub cleanup_interval_secs: u64,

    /// Comma-separated CORS origin allow-list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        Self {
            bind_address: env_or("JPG2PDF_BIND", "0.0.0.0:8000"),
            database_url: env_or("JPG2PDF_DATABASE_URL", "sqlite://jpg2pdf.db"),
            media_root: PathBuf::from(env_or("JPG2PDF_MEDIA_ROOT", "media")),
            max_upload_mb: parse_or(&lookup, "JPG2PDF_MAX_UPLOAD_MB", 50),
            sniff_content: flag_or(&lookup, "JPG2PDF_SNIFF_CONTENT", true),
            retention_hours: parse_or(&lookup, "JPG2PDF_RETENTION_HOURS", DEFAULT_RETENTION_HOURS),
            cleanup_interval_secs: parse_or(&lookup, "JPG2PDF_CLEANUP_INTERVAL_SECS", 3600),
            cors_allowed_origins: lookup("JPG2PDF_CORS_ORIGINS").filter(|v| !v.trim().is_empty()),
            enable_swagger: flag_or(&lookup, "JPG2PDF_ENABLE_SWAGGER", true),
            log_level: env_or("JPG2PDF_LOG", "info"),
            log_json: flag_or(&lookup, "JPG2PDF_LOG_JSON", false),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
            sniff_content: self.sniff_content,
        }
    }

    /// Out-of-range hour counts fall back to the 24-hour default.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.retention_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_RETENTION_HOURS))
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key) {
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}
