//! Health check handlers for service monitoring.
//!
//! The directory is loaded before the listener binds, so a running process
//! always has one. `/health` reports whether it can route anybody.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use switchboard_core::{Clock, Directory};
use tracing::{debug, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Calls can be routed
    Healthy,
    /// Serving, but no employee can take calls
    Degraded,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Loaded employee directory
    pub directory: DirectoryHealth,
}

/// Directory statistics.
#[derive(Debug, Serialize)]
pub struct DirectoryHealth {
    /// `up` when at least one employee is routable
    pub status: ComponentStatus,
    /// Records loaded
    pub employees: usize,
    /// Records with a phone number
    pub routable: usize,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Health service that encapsulates the clock for testable health checks.
pub struct HealthService {
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Creates a new health service with the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Summarizes directory health.
    pub fn health_check(&self, directory: &Directory) -> HealthResponse {
        let routable = directory.routable_count();
        let (status, component) = if routable > 0 {
            (HealthStatus::Healthy, ComponentStatus::Up)
        } else {
            (HealthStatus::Degraded, ComponentStatus::Down)
        };

        HealthResponse {
            status,
            timestamp: self.clock.now_utc(),
            checks: HealthChecks {
                directory: DirectoryHealth {
                    status: component,
                    employees: directory.len(),
                    routable,
                },
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Plain-text banner at `/`.
pub async fn index() -> &'static str {
    "Switchboard call transfer service is running."
}

/// Health check endpoint handler.
///
/// Degraded still answers 200: the process is up and will answer every
/// call with the no-route announcement.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let response = HealthService::new(app_state.clock.clone()).health_check(app_state.directory());

    debug!(
        status = ?response.status,
        routable = response.checks.directory.routable,
        "Health check completed"
    );

    (StatusCode::OK, Json(response)).into_response()
}

/// Liveness check endpoint for orchestration probes.
#[instrument(name = "liveness_check", skip(app_state))]
pub async fn liveness_check(State(app_state): State<AppState>) -> Response {
    let response = serde_json::json!({
        "status": "alive",
        "timestamp": app_state.clock.now_utc(),
        "service": "switchboard-api"
    });

    (StatusCode::OK, Json(response)).into_response()
}
