//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. Timeout enforcement
//! 4. Shared-secret authentication: `X-Vapi-Secret` on `/tool-call`,
//!    `X-API-Key` on `/transfer`. `/webhook` authenticates after parsing
//!    its body
//! 5. Handler execution
//!
//! # Graceful Shutdown
//!
//! On SIGTERM or CTRL+C the server stops accepting connections and lets
//! in-flight requests finish.

use std::net::SocketAddr;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    handlers,
    middleware::auth::{api_key_middleware, webhook_secret_middleware},
    AppState,
};

/// Correlation id attached to every request and echoed as `X-Request-Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use switchboard_api::{create_router, AppState, Config};
///
/// fn build() -> anyhow::Result<axum::Router> {
///     let config = Config::load()?;
///     Ok(create_router(AppState::from_config(&config)?))
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/live", get(handlers::liveness_check));

    let tool_routes = Router::new()
        .route("/tool-call", post(handlers::handle_tool_call))
        .layer(middleware::from_fn_with_state(state.clone(), webhook_secret_middleware));

    let transfer_routes = Router::new()
        .route("/transfer", post(handlers::handle_transfer))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_middleware));

    let webhook_routes = Router::new().route("/webhook", post(handlers::handle_webhook));

    Router::new()
        .merge(health_routes)
        .merge(tool_routes)
        .merge(transfer_routes)
        .merge(webhook_routes)
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject a request ID into all requests and responses.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serves on an already-bound listener until a shutdown signal arrives.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use switchboard_core::{
        ApiKey, Directory, EmployeeId, EmployeeRecord, NoOpTransactionLog, Router as CallRouter,
        RoutingPolicy,
    };
    use tower::ServiceExt;

    use super::*;

    fn state() -> AppState {
        let directory = Directory::from_records(vec![EmployeeRecord {
            id: EmployeeId(1),
            name: "Alice Smith".to_string(),
            department: "Sales".to_string(),
            phone: "+15551234567".to_string(),
            email: String::new(),
        }])
        .unwrap();
        let router = CallRouter::new(Arc::new(directory), RoutingPolicy::default()).unwrap();
        AppState::new(router, ApiKey::new("secret123"), Arc::new(NoOpTransactionLog))
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = create_router(state())
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = create_router(state())
            .oneshot(Request::post("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
