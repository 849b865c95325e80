//! Informational HTML pages and `robots.txt`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use jpg2pdf_core::ConversionKind;
use minijinja::{context, Environment, Value};
use strum::IntoEnumIterator;

use crate::error::ServerError;
use crate::schemas::contact::INQUIRY_TYPES;
use crate::state::AppState;

/// Compiled page templates, embedded in the binary.
#[derive(Debug)]
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn load() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("home.html", include_str!("../templates/home.html"))?;
        env.add_template(
            "privacy_policy.html",
            include_str!("../templates/privacy_policy.html"),
        )?;
        env.add_template(
            "terms_of_service.html",
            include_str!("../templates/terms_of_service.html"),
        )?;
        env.add_template("contact_us.html", include_str!("../templates/contact_us.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/privacy-policy/", get(privacy_policy))
        .route("/privacy-policy", get(privacy_policy))
        .route("/terms-of-service/", get(terms_of_service))
        .route("/terms-of-service", get(terms_of_service))
        .route("/contact-us/", get(contact_us))
        .route("/contact-us", get(contact_us))
        .route("/robots.txt", get(robots_txt))
}

fn render(
    state: &AppState,
    name: &str,
    page_title: &str,
    meta_description: &str,
    extra: Value,
) -> Result<Html<String>, ServerError> {
    let ctx = context! {
        page_title,
        meta_description,
        max_upload_mb => state.config.max_upload_mb,
        retention_hours => state.config.retention_hours,
        ..extra
    };
    Ok(Html(state.pages.render(name, ctx)?))
}

async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    let kinds: Vec<Value> = ConversionKind::iter()
        .map(|k| context! { value => k.as_ref(), label => k.label() })
        .collect();
    render(
        &state,
        "home.html",
        "JPG to PDF Converter - Free Online Image to PDF",
        "Convert JPG, PNG, GIF, BMP and WebP images to PDF online. Resize and compress images.",
        context! { kinds },
    )
}

async fn privacy_policy(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    render(
        &state,
        "privacy_policy.html",
        "Privacy Policy - JPG to PDF Converter",
        "How uploaded files and conversion records are handled and when they are deleted.",
        context! {},
    )
}

async fn terms_of_service(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ServerError> {
    render(
        &state,
        "terms_of_service.html",
        "Terms of Service - JPG to PDF Converter",
        "Terms and conditions for using the JPG to PDF converter.",
        context! {},
    )
}

async fn contact_us(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    let inquiry_types: Vec<Value> = INQUIRY_TYPES
        .iter()
        .map(|(value, label)| context! { value, label })
        .collect();
    render(
        &state,
        "contact_us.html",
        "Contact Us - JPG to PDF Converter Support",
        "Contact us for support with conversions, feedback or questions.",
        context! { inquiry_types },
    )
}

async fn robots_txt(headers: HeaderMap) -> impl IntoResponse {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|v| *v == "https" || *v == "http")
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_body(scheme, host),
    )
}

fn robots_body(scheme: &str, host: &str) -> String {
    format!(
        "User-agent: *\n\
         Allow: /\n\
         \n\
         Disallow: /media/uploads/\n\
         Disallow: /media/converted/\n\
         Disallow: /download/\n\
         Disallow: /upload/\n\
         Disallow: /status/\n\
         Disallow: /api-docs/\n\
         Disallow: /swagger-ui/\n\
         Disallow: /*.json$\n\
         Disallow: /.env\n\
         Disallow: /.git/\n\
         \n\
         Sitemap: {scheme}://{host}/sitemap.xml\n\
         \n\
         Crawl-delay: 1\n"
    )
}
