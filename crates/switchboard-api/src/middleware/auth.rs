//! Shared-secret authentication middleware.
//!
//! `/transfer` expects the API key in `X-API-Key`; `/tool-call` expects the
//! voice assistant's secret in `X-Vapi-Secret`. Rejections are written to
//! the transaction log like any other response, including the body the
//! caller sent.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use switchboard_core::{
    models::parse_json_object, ApiKey, RouterError, API_KEY_HEADER, WEBHOOK_SECRET_HEADER,
};
use tracing::warn;

use crate::{
    handlers::{raw_body_for_log, Exchange},
    server::RequestId,
    AppState,
};

/// Largest rejected body buffered for the transaction log.
const MAX_REJECTED_BODY: usize = 64 * 1024;

/// Extracts the presented key from `X-API-Key`.
///
/// Values that are not visible ASCII are treated as absent.
pub fn presented_api_key(headers: &HeaderMap) -> Option<&str> {
    presented_secret(headers, API_KEY_HEADER)
}

fn presented_secret<'a>(headers: &'a HeaderMap, header: &str) -> Option<&'a str> {
    headers.get(header).and_then(|v| v.to_str().ok())
}

/// Axum middleware that rejects requests without the shared API key.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let secret = state.api_key.clone();
    guard(&state, &secret, API_KEY_HEADER, req, next).await
}

/// Axum middleware that rejects tool calls without the assistant's secret.
pub async fn webhook_secret_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let secret = state.webhook_secret.clone();
    guard(&state, &secret, WEBHOOK_SECRET_HEADER, req, next).await
}

async fn guard(
    state: &AppState,
    secret: &ApiKey,
    header: &'static str,
    req: Request<Body>,
    next: Next,
) -> Response {
    match secret.verify(presented_secret(req.headers(), header)) {
        Ok(()) => next.run(req).await,
        Err(e) => reject(state, header, req, &e).await,
    }
}

async fn reject(state: &AppState, header: &str, req: Request<Body>, error: &RouterError) -> Response {
    let route = match req.uri().path() {
        "/transfer" => "/transfer",
        "/tool-call" => "/tool-call",
        _ => "unknown",
    };
    let request_id = req.extensions().get::<RequestId>().cloned();
    warn!(route, header, error = %error, "Unauthorized access attempt");

    let request = match to_bytes(req.into_body(), MAX_REJECTED_BODY).await {
        Ok(body) => parse_json_object(&body).unwrap_or_else(|_| raw_body_for_log(&body)),
        Err(e) => {
            warn!(route, error = %e, "Rejected request body not buffered");
            Value::Null
        },
    };

    Exchange::new(state, route, request_id.as_ref()).fail(request, error).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn presented_key_is_read_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", HeaderValue::from_static("secret123"));

        assert_eq!(presented_api_key(&headers), Some("secret123"));
    }

    #[test]
    fn presented_key_absent_without_header() {
        assert_eq!(presented_api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn non_ascii_key_is_treated_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        assert_eq!(presented_api_key(&headers), None);
    }

    #[test]
    fn webhook_secret_is_read_from_its_own_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Vapi-Secret", HeaderValue::from_static("hook"));

        assert_eq!(presented_secret(&headers, WEBHOOK_SECRET_HEADER), Some("hook"));
        assert_eq!(presented_api_key(&headers), None);
    }
}
