//! Contact form submission.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::post;
use axum::{Form, Json, Router};
use chrono::Utc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{ContactMessage, ContactStore};
use crate::error::ServerError;
use crate::schemas::contact::{ContactForm, ContactResponse, THANK_YOU_MESSAGE};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(submit_contact), components(schemas(ContactForm, ContactResponse)))]
pub struct ContactApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contact/submit/", post(submit_contact))
        .route("/contact/submit", post(submit_contact))
}

/// Client address as reported by a fronting proxy, if any.
fn remote_addr(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    forwarded.or(real_ip).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Store a contact message.
#[utoipa::path(
    post,
    path = "/contact/submit/",
    tag = "contact",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Message accepted", body = ContactResponse),
        (status = 400, description = "Missing field, invalid e-mail or bad message length"),
    )
)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Result<Json<ContactResponse>, ServerError> {
    form.check()
        .map_err(|msg| ServerError::BadRequest(msg.to_owned()))?;

    let message = ContactMessage {
        id: Uuid::new_v4(),
        inquiry_type: form.inquiry_label().to_owned(),
        name: form.name,
        email: form.email,
        subject: form.subject,
        message: form.message,
        remote_addr: remote_addr(&headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        created_at: Utc::now(),
    };
    state.store.insert_contact_message(&message).await?;
    info!(
        message_id = %message.id,
        inquiry_type = %message.inquiry_type,
        subject = %message.subject,
        remote_addr = ?message.remote_addr,
        "contact message received"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: THANK_YOU_MESSAGE.to_owned(),
    }))
}
