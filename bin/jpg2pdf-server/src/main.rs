//! jpg2pdf-server – entry point.
//!
//! Startup order:
//! 1. Parse the command line and configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database, run pending migrations and create the
//!    media directories.
//! 4. Either run a single cleanup sweep and exit (`cleanup`), or start the
//!    periodic cleanup task and the HTTP server with graceful shutdown
//!    (`serve`, the default).

mod cleanup;
mod config;
mod entities;
mod error;
mod media;
mod middleware;
mod routes;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::state::AppState;

/// Convert uploaded images to PDF, resize or compress them.
#[derive(Parser, Debug)]
#[command(name = "jpg2pdf-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default, Clone, Copy)]
enum Command {
    /// Run the HTTP server (default).
    #[default]
    Serve,
    /// Delete jobs older than the retention window, with their files, and exit.
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Command line & configuration ────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: JPG2PDF_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "jpg2pdf-server starting");

    // ── 3. Database & media ────────────────────────────────────────────────────
    let store = SqliteStore::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    let state = Arc::new(AppState::new(cfg.clone(), store)?);
    state.media.ensure_dirs().await?;
    info!(media_root = %cfg.media_root.display(), "media directories ready");

    // ── 4. Command ─────────────────────────────────────────────────────────────
    match cli.command.unwrap_or_default() {
        Command::Cleanup => {
            let report =
                cleanup::sweep(state.store.as_ref(), &state.media, cfg.retention(), Utc::now())
                    .await?;
            println!(
                "Removed {} expired jobs and {} files ({} failures)",
                report.jobs_removed, report.files_removed, report.failures
            );
            Ok(())
        }
        Command::Serve => serve(state).await,
    }
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let cleaner = cleanup::spawn_periodic(Arc::clone(&state));

    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = state.config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cleaner {
        handle.abort();
    }
    info!("jpg2pdf-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
