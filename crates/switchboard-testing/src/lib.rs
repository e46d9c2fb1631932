//! Test infrastructure for deterministic testing of the switchboard service.
//!
//! Provides an in-process application with a known directory, a captured
//! transaction log, a controllable clock, and helpers that drive the router
//! through `tower::ServiceExt::oneshot` without binding a socket.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router as HttpRouter,
};
use serde_json::Value;
use switchboard_api::{create_router, AppState};
use switchboard_core::{
    ApiKey, Directory, EmployeeId, RoutingPolicy, Router, TestClock, TransactionRecord,
    API_KEY_HEADER, WEBHOOK_SECRET_HEADER,
};
use tower::ServiceExt;

pub mod capture;
pub mod fixtures;

pub use capture::MemoryTransactionLog;
pub use fixtures::{sample_directory, sample_employees, DirectoryBuilder, EmployeeBuilder};

/// API key every [`TestEnv`] is configured with unless overridden.
pub const TEST_API_KEY: &str = "secret123";

/// Tool-call webhook secret every [`TestEnv`] is configured with.
pub const TEST_WEBHOOK_SECRET: &str = "vapi-secret-456";

/// Largest response body the helpers will buffer.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Builder for a [`TestEnv`].
#[derive(Debug)]
pub struct TestEnvBuilder {
    directory: DirectoryBuilder,
    policy: RoutingPolicy,
    api_key: String,
    webhook_secret: String,
    request_timeout: Duration,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self {
            directory: DirectoryBuilder::sample(),
            policy: RoutingPolicy::default(),
            api_key: TEST_API_KEY.to_string(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl TestEnvBuilder {
    /// Starts from the sample company with default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the directory.
    #[must_use]
    pub fn directory(mut self, directory: DirectoryBuilder) -> Self {
        self.directory = directory;
        self
    }

    /// Sets the fallback employee.
    #[must_use]
    pub fn fallback(mut self, id: u64) -> Self {
        self.policy.fallback = Some(EmployeeId(id));
        self
    }

    /// Sets the connect announcement.
    #[must_use]
    pub fn announcement(mut self, text: impl Into<String>) -> Self {
        self.policy.announcement = text.into();
        self
    }

    /// Sets the no-route announcement.
    #[must_use]
    pub fn no_route_message(mut self, text: impl Into<String>) -> Self {
        self.policy.no_route_message = text.into();
        self
    }

    /// Sets the shared API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Sets the tool-call webhook secret.
    #[must_use]
    pub fn webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = secret.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the environment.
    ///
    /// # Errors
    ///
    /// Fails when the directory has duplicate ids or the fallback cannot
    /// take calls.
    pub fn build(self) -> Result<TestEnv> {
        let directory = Arc::new(self.directory.build()?);
        let router = Router::new(directory, self.policy).context("Invalid test routing policy")?;

        let transactions = MemoryTransactionLog::new();
        let clock = TestClock::new();
        let api_key = ApiKey::new(self.api_key.clone());
        let state = AppState::new(router, api_key, Arc::new(transactions.clone()))
            .with_webhook_secret(ApiKey::new(self.webhook_secret.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_request_timeout(self.request_timeout);

        Ok(TestEnv {
            state,
            transactions,
            clock,
            api_key: self.api_key,
            webhook_secret: self.webhook_secret,
        })
    }
}

/// In-process switchboard application for integration tests.
#[derive(Debug, Clone)]
pub struct TestEnv {
    /// Application state shared by every request
    pub state: AppState,
    /// Captured transaction records
    pub transactions: MemoryTransactionLog,
    /// Deterministic clock used for record timestamps
    pub clock: TestClock,
    api_key: String,
    webhook_secret: String,
}

impl TestEnv {
    /// Sample company, default policy, key [`TEST_API_KEY`].
    pub fn new() -> Result<Self> {
        TestEnvBuilder::new().build()
    }

    /// Starts a builder.
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::new()
    }

    /// The configured API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The configured tool-call webhook secret.
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// The loaded directory.
    pub fn directory(&self) -> &Directory {
        self.state.directory()
    }

    /// Fresh router over the shared state.
    pub fn app(&self) -> HttpRouter {
        create_router(self.state.clone())
    }

    /// Advances the test clock.
    pub fn advance_time(&self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Every transaction record so far.
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.transactions.records()
    }

    /// Sends a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.app().oneshot(request).await.context("Router failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
            .await
            .context("Failed to read response body")?;

        Ok(TestResponse { status, headers, body: bytes.to_vec() })
    }

    /// POSTs a JSON body with the configured key.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<TestResponse> {
        self.post_raw(path, Some(&self.api_key), body.to_string().into_bytes()).await
    }

    /// POSTs a tool call with the configured webhook secret.
    pub async fn post_tool_call(&self, body: &Value) -> Result<TestResponse> {
        self.post_with_secret(
            "/tool-call",
            WEBHOOK_SECRET_HEADER,
            Some(&self.webhook_secret),
            body.to_string().into_bytes(),
        )
        .await
    }

    /// POSTs arbitrary bytes, optionally with an `X-API-Key` header.
    pub async fn post_raw(
        &self,
        path: &str,
        api_key: Option<&str>,
        body: impl Into<Body>,
    ) -> Result<TestResponse> {
        self.post_with_secret(path, API_KEY_HEADER, api_key, body).await
    }

    /// POSTs arbitrary bytes, optionally with `secret` in `header`.
    pub async fn post_with_secret(
        &self,
        path: &str,
        header_name: &str,
        secret: Option<&str>,
        body: impl Into<Body>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header(header_name, secret);
        }

        let request = builder.body(body.into()).context("Failed to build request")?;
        self.send(request).await
    }

    /// GETs `path` without credentials.
    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .context("Failed to build request")?;
        self.send(request).await
    }
}

/// Buffered response from [`TestEnv::send`].
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("Response body is not JSON")
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone()).context("Response body is not UTF-8")
    }

    /// The `X-Request-Id` header, when present.
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get("x-request-id").and_then(|v| v.to_str().ok())
    }
}
