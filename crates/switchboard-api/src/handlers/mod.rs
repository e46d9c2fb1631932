//! HTTP request handlers for the switchboard API.
//!
//! Routing handlers share one shape: parse, authenticate, route, then answer
//! through an [`Exchange`] so every response is mirrored into the
//! transaction log.
//!
//! # Error Handling
//!
//! Error bodies are always JSON with an `error` kind, a stable `code` from
//! the core taxonomy, and a `message` that never includes file paths or
//! internal sources.

pub mod health;
pub mod tool_call;
pub mod transfer;
pub mod webhook;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use switchboard_core::{Outcome, RouterError, TransactionRecord};
use tracing::error;

pub use health::{health_check, index, liveness_check};
pub use tool_call::handle_tool_call;
pub use transfer::handle_transfer;
pub use webhook::handle_webhook;

use crate::{server::RequestId, AppState};

/// Longest raw body kept in the transaction log when it is not valid JSON.
const MAX_RAW_BODY_LOGGED: usize = 4096;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error kind, e.g. `Unauthorized`
    pub error: String,
    /// Stable error code (E1001-E9999)
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorResponse {
    /// Builds the public body for an error.
    pub fn from_error(error: &RouterError) -> Self {
        Self {
            error: error.kind().to_string(),
            code: error.code().to_string(),
            message: error.public_message(),
        }
    }
}

/// HTTP status for an error.
pub fn status_for(error: &RouterError) -> StatusCode {
    match error {
        RouterError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        RouterError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn outcome_for(error: &RouterError) -> Outcome {
    match error {
        RouterError::Unauthorized { header_present } => {
            Outcome::Unauthorized { header_present: *header_present }
        },
        RouterError::MalformedRequest { reason } => Outcome::Malformed { reason: reason.clone() },
        _ => Outcome::Internal,
    }
}

/// One request/response pair on its way to the transaction log.
pub(crate) struct Exchange<'a> {
    state: &'a AppState,
    route: &'static str,
    request_id: Option<String>,
}

impl<'a> Exchange<'a> {
    pub(crate) fn new(
        state: &'a AppState,
        route: &'static str,
        request_id: Option<&RequestId>,
    ) -> Self {
        Self { state, route, request_id: request_id.map(|id| id.0.clone()) }
    }

    /// Records the exchange and returns `body` with `status`.
    pub(crate) async fn respond(
        &self,
        request: Value,
        outcome: Outcome,
        status: StatusCode,
        body: Value,
    ) -> Response {
        let record = TransactionRecord {
            timestamp: self.state.clock.now_utc(),
            route: self.route.to_string(),
            request_id: self.request_id.clone(),
            request,
            outcome,
            status: status.as_u16(),
            response: body.clone(),
        };
        self.state.transactions.record(record).await;

        (status, Json(body)).into_response()
    }

    /// Records and returns the standard error body for `error`.
    pub(crate) async fn fail(&self, request: Value, error: &RouterError) -> Response {
        let status = status_for(error);
        if status.is_server_error() {
            error!(route = self.route, error = %error, "Request failed");
        }

        let body = match serde_json::to_value(ErrorResponse::from_error(error)) {
            Ok(body) => body,
            Err(_) => serde_json::json!({ "error": error.kind() }),
        };
        self.respond(request, outcome_for(error), status, body).await
    }
}

/// Best-effort copy of a body that failed to parse.
pub(crate) fn raw_body_for_log(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    let text = String::from_utf8_lossy(body);
    Value::String(text.chars().take(MAX_RAW_BODY_LOGGED).collect())
}

/// Top-level keys of a JSON object, for audit logging.
pub(crate) fn payload_shape(value: &Value) -> String {
    match value {
        Value::Object(map) => map.keys().cloned().collect::<Vec<_>>().join(","),
        Value::Null => "none".to_string(),
        _ => "non-object".to_string(),
    }
}
