//! Voice-assistant tool call: resolve a requested person to a phone number.
//!
//! The `X-Vapi-Secret` middleware authenticates before this handler runs. Results use the assistant's `{"results": [...]}` envelope.

use axum::{extract::State, http::StatusCode, response::Response, Extension};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use switchboard_core::{models::parse_json_object, Outcome, RouterError, WebhookRequest};
use tracing::{info, instrument, warn};

use super::{raw_body_for_log, Exchange};
use crate::{server::RequestId, AppState};

/// Response envelope for tool calls.
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    /// One entry per tool call, always exactly one here
    pub results: Vec<ToolCallResult>,
}

/// Result of a single tool call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Echo of the request's `toolCallId`
    pub tool_call_id: String,
    /// Phone number, or a message when nothing was found
    pub result: String,
}

impl ToolCallResponse {
    fn single(tool_call_id: &str, result: impl Into<String>) -> Value {
        let response = Self {
            results: vec![ToolCallResult {
                tool_call_id: tool_call_id.to_string(),
                result: result.into(),
            }],
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }
}

/// Handles `POST /tool-call`.
///
/// Contact names match ignoring case and surrounding whitespace.
///
/// # Errors
///
/// - 400: invalid body, missing `toolCallId`, or missing `requestedParty`
/// - 404: nobody in the directory has that name
#[instrument(
    name = "handle_tool_call",
    skip_all,
    fields(request_id = request_id.as_ref().map_or("none", |Extension(id)| id.0.as_str()))
)]
pub async fn handle_tool_call(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> Response {
    let exchange =
        Exchange::new(&state, "/tool-call", request_id.as_ref().map(|Extension(id)| id));

    let (request, raw) = match parse_json_object(&body)
        .and_then(|raw| WebhookRequest::from_value(&raw).map(|request| (request, raw)))
    {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejected tool call with malformed body");
            return exchange.fail(raw_body_for_log(&body), &e).await;
        },
    };

    let Some(tool_call_id) = request.tool_call_id.clone().filter(|id| !id.is_empty()) else {
        warn!("toolCallId missing in request data");
        return exchange.fail(raw, &RouterError::malformed("Missing toolCallId")).await;
    };

    let Some(party) = request.requested_party.clone().filter(|p| !p.trim().is_empty()) else {
        warn!(tool_call_id = %tool_call_id, "requestedParty not provided in request data");
        let body = ToolCallResponse::single(&tool_call_id, "ERROR: requestedParty not provided");
        let outcome = Outcome::Malformed { reason: "requestedParty not provided".to_string() };
        return exchange.respond(raw, outcome, StatusCode::BAD_REQUEST, body).await;
    };

    match state.directory().find_by_name_ignore_case(&party) {
        Some(employee) => {
            info!(
                tool_call_id = %tool_call_id,
                employee_id = %employee.id,
                employee_name = %employee.name,
                "Resolved tool call to employee"
            );
            let body = ToolCallResponse::single(&tool_call_id, employee.phone.clone());
            let outcome = Outcome::Routed { employee_id: employee.id, fallback: false };
            exchange.respond(raw, outcome, StatusCode::OK, body).await
        },
        None => {
            warn!(tool_call_id = %tool_call_id, requested_party = %party, "No such contact");
            let body = ToolCallResponse::single(&tool_call_id, format!("No such contact: {party}"));
            exchange.respond(raw, Outcome::NoRoute, StatusCode::NOT_FOUND, body).await
        },
    }
}
