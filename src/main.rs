//! Switchboard call transfer service.
//!
//! Main entry point. Loads configuration and the employee directory, then
//! serves the webhook until a shutdown signal arrives. Any directory or
//! routing configuration problem aborts startup before the listener binds.

use anyhow::{Context, Result};
use switchboard_api::{AppState, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log);

    info!("Starting switchboard call transfer service");

    let addr = config.parse_server_addr()?;
    info!(
        server_addr = %addr,
        directory = %config.directory_path.display(),
        fallback_employee_id = ?config.fallback_employee_id,
        request_timeout_secs = config.request_timeout,
        "Configuration loaded"
    );

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Startup configuration failure: {e:#}");
            return Err(e);
        },
    };
    info!(
        employees = state.directory().len(),
        routable = state.directory().routable_count(),
        "Employee directory loaded"
    );

    switchboard_api::start_server(state, addr).await.context("Server failed")?;

    info!("Switchboard shutdown complete");
    Ok(())
}

/// Initializes tracing. `RUST_LOG` wins over the configured default.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info,switchboard=debug,tower_http=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
