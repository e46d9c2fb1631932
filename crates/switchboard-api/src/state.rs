//! Shared application state handed to every handler.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use switchboard_core::{
    ApiKey, Clock, Directory, FileTransactionLog, RealClock, Router, TransactionLog,
};
use tracing::{info, warn};

use crate::config::Config;

/// Immutable state built once at startup.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory plus routing policy
    pub router: Arc<Router>,
    /// Shared secret for `X-API-Key`
    pub api_key: Arc<ApiKey>,
    /// Assistant secret for `X-Vapi-Secret` on `/tool-call`
    pub webhook_secret: Arc<ApiKey>,
    /// Transaction record sink
    pub transactions: Arc<dyn TransactionLog>,
    /// Time source for records and health responses
    pub clock: Arc<dyn Clock>,
    /// Per-request timeout enforced by the HTTP layer
    pub request_timeout: Duration,
}

impl AppState {
    /// Assembles state from already-built parts with a real clock and the
    /// development webhook secret.
    pub fn new(router: Router, api_key: ApiKey, transactions: Arc<dyn TransactionLog>) -> Self {
        Self {
            router: Arc::new(router),
            api_key: Arc::new(api_key),
            webhook_secret: Arc::new(ApiKey::webhook_secret_from_config(None)),
            transactions,
            clock: Arc::new(RealClock::new()),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Replaces the tool-call webhook secret.
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: ApiKey) -> Self {
        self.webhook_secret = Arc::new(secret);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Loads the directory and builds state from configuration.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal: a missing or invalid directory, duplicate
    /// ids, or a fallback employee that cannot take calls.
    pub fn from_config(config: &Config) -> Result<Self> {
        let directory = Directory::load(&config.directory_path).with_context(|| {
            format!("Failed to load employee directory from {}", config.directory_path.display())
        })?;

        let router = Router::new(Arc::new(directory), config.to_routing_policy())
            .context("Invalid routing configuration")?;

        let api_key = config.api_key();
        let webhook_secret = config.webhook_secret();
        if api_key.is_development() || webhook_secret.is_development() {
            warn!(
                api_key_default = api_key.is_development(),
                webhook_secret_default = webhook_secret.is_development(),
                "No API keys set. Using development defaults - DO NOT USE IN LIVE ENVIRONMENT! \
                 Set FLASK_API_KEY and VAPI_WEBHOOK_SECRET before deploying"
            );
        }

        let transactions = Arc::new(FileTransactionLog::new(&config.transaction_log_path));
        info!(
            path = %config.transaction_log_path.display(),
            "Transaction log configured"
        );

        Ok(Self::new(router, api_key, transactions)
            .with_webhook_secret(webhook_secret)
            .with_request_timeout(config.request_timeout()))
    }

    /// The loaded directory.
    pub fn directory(&self) -> &Directory {
        self.router.directory()
    }
}
