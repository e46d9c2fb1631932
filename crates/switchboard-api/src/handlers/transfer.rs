//! Transfer acknowledgement for callers outside the voice platform.

use axum::{extract::State, http::StatusCode, response::Response, Extension};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_core::{models::parse_json_object, Outcome, RouterError};
use tracing::{info, instrument, warn};

use super::{raw_body_for_log, Exchange};
use crate::{server::RequestId, AppState};

/// Body of `POST /transfer`.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Number the caller wants the call moved to
    pub target_number: String,
}

/// Acknowledgement returned on success.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Fixed acknowledgement text
    pub message: String,
    /// Echo of the requested number
    pub target_number: String,
}

/// Handles `POST /transfer`.
///
/// # Errors
///
/// - 400: body is not JSON or `target_number` is missing
#[instrument(
    name = "handle_transfer",
    skip_all,
    fields(request_id = request_id.as_ref().map_or("none", |Extension(id)| id.0.as_str()))
)]
pub async fn handle_transfer(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> Response {
    let exchange = Exchange::new(&state, "/transfer", request_id.as_ref().map(|Extension(id)| id));

    let raw = match parse_json_object(&body) {
        Ok(raw) => raw,
        Err(e) => return exchange.fail(raw_body_for_log(&body), &e).await,
    };

    let request = match TransferRequest::deserialize(&raw) {
        Ok(request) if !request.target_number.trim().is_empty() => request,
        _ => {
            warn!("Transfer request without target_number");
            let error = RouterError::malformed("Missing required field: target_number");
            return exchange.fail(raw, &error).await;
        },
    };

    info!(target_number = %request.target_number, "Processing transfer request");

    let response = TransferResponse {
        message: "Transfer request received".to_string(),
        target_number: request.target_number,
    };
    let body = serde_json::to_value(response).unwrap_or(Value::Null);
    exchange.respond(raw, Outcome::Accepted, StatusCode::OK, body).await
}
