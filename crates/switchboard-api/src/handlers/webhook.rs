//! Call-event webhook: authenticate, route, answer with an action script.
//!
//! Processing order is fixed. The body is parsed first so a malformed body
//! is a 400 whatever the credential; the API key is checked before the
//! directory is touched; only then is the request routed.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Extension,
};
use bytes::Bytes;
use switchboard_core::{
    models::parse_json_object, MatchSource, Outcome, RouteDecision, RouterError, WebhookRequest,
};
use tracing::{info, instrument, warn};

use super::{payload_shape, raw_body_for_log, Exchange};
use crate::{middleware::auth::presented_api_key, server::RequestId, AppState};

/// Handles `POST /webhook`.
///
/// Returns 200 with the action script on success, including the
/// announce-only script when no employee can take the call.
///
/// # Errors
///
/// - 400: body is not a JSON object or a known field has the wrong type
/// - 401: `X-API-Key` missing or wrong
/// - 500: the script could not be serialized
#[instrument(
    name = "handle_webhook",
    skip_all,
    fields(
        request_id = request_id.as_ref().map_or("none", |Extension(id)| id.0.as_str()),
        api_key_present = headers.contains_key(switchboard_core::API_KEY_HEADER),
    )
)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let exchange = Exchange::new(&state, "/webhook", request_id.as_ref().map(|Extension(id)| id));

    let raw = match parse_json_object(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, body_len = body.len(), "Rejected webhook with malformed body");
            return exchange.fail(raw_body_for_log(&body), &e).await;
        },
    };

    if let Err(e) = state.api_key.verify(presented_api_key(&headers)) {
        warn!(payload_shape = %payload_shape(&raw), error = %e, "Webhook authentication failed");
        return exchange.fail(raw, &e).await;
    }

    let request = match WebhookRequest::from_value(&raw) {
        Ok(request) => request,
        Err(e) => {
            warn!(payload_shape = %payload_shape(&raw), error = %e, "Rejected webhook payload");
            return exchange.fail(raw, &e).await;
        },
    };

    info!(caller = request.caller_label(), "Incoming call webhook");

    let decision = state.router.route(&request);
    let script = state.router.script(&decision);

    let outcome = match &decision {
        RouteDecision::Matched { employee, source, key } => {
            info!(
                employee_id = %employee.id,
                employee_name = %employee.name,
                department = %employee.department,
                routing_key = ?key,
                fallback = *source == MatchSource::Fallback,
                "Routing call to employee"
            );
            Outcome::Routed { employee_id: employee.id, fallback: *source == MatchSource::Fallback }
        },
        RouteDecision::NoRoute { key } => {
            warn!(routing_key = ?key, "No employee available for call");
            Outcome::NoRoute
        },
    };

    match serde_json::to_value(&script) {
        Ok(body) => exchange.respond(raw, outcome, StatusCode::OK, body).await,
        Err(e) => exchange.fail(raw, &RouterError::Other(e.into())).await,
    }
}

