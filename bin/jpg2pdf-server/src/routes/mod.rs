//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection, body limit)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `JPG2PDF_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - Upload, status and download routes
//! - Contact form submission
//! - Informational HTML pages and `robots.txt`

mod contact;
mod convert;
pub mod doc;
mod health;
pub mod pages;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Headroom over the upload cap for multipart framing and the other fields,
/// so the size check in the upload handler reports oversized files first.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.config.upload_policy().max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let mut app = Router::new()
        .merge(health::router())
        .merge(convert::router())
        .merge(contact::router())
        .merge(pages::router());

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
