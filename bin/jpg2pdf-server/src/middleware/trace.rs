use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// Bodies are only buffered for logging when they are JSON and smaller
/// than this. Uploads and downloads stream through untouched.
const MAX_LOGGED_BODY: u64 = 1024;

pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        let (parts, body) = req.into_parts();
        let body = log_small_json("request", &parts.headers, body).await;
        let mut req = Request::from_parts(parts, body);
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (mut parts, body) = response.into_parts();
        let body = log_small_json("response", &parts.headers, body).await;
        if let Some(value) = trace_header {
            parts.headers.insert(X_TRACE_ID, value);
        }

        info!(
            status = parts.status.as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );
        Response::from_parts(parts, body)
    }
    .instrument(span)
    .await
}

/// `exact_len` is the body's own size hint, used when no Content-Length
/// header is set (typical for handler-built responses).
fn is_small_json(headers: &HeaderMap, exact_len: Option<u64>) -> bool {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .or(exact_len);
    is_json && len.is_some_and(|len| len < MAX_LOGGED_BODY)
}

async fn log_small_json(direction: &str, headers: &HeaderMap, body: Body) -> Body {
    if !is_small_json(headers, body.size_hint().exact()) {
        return body;
    }
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };
    if let Ok(text) = std::str::from_utf8(&bytes) {
        info!(body = text, "{direction} body");
    }
    Body::from(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::{middleware, routing::get, Json, Router};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { Json(serde_json::json!({ "pong": true })) }))
            .layer(middleware::from_fn(trace_middleware))
    }

    #[tokio::test]
    #[traced_test]
    async fn assigns_a_trace_id_and_logs_small_json() {
        let response = app()
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get(X_TRACE_ID).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"pong":true}"#);
        assert!(logs_contain("response body"));
    }

    #[tokio::test]
    async fn propagates_a_valid_incoming_trace_id() {
        let id = Uuid::new_v4().to_string();
        let response = app()
            .oneshot(
                Request::get("/ping")
                    .header(X_TRACE_ID, &id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(X_TRACE_ID).unwrap(), id.as_str());
    }

    #[test]
    fn only_small_json_is_buffered() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_small_json(&headers, None));
        assert!(is_small_json(&headers, Some(12)));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        assert!(is_small_json(&headers, None));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("4096"));
        assert!(!is_small_json(&headers, Some(12)));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        assert!(!is_small_json(&headers, None));
    }
}
