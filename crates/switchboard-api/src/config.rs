//! Configuration management for the switchboard webhook router.

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use switchboard_core::{
    routing::{DEFAULT_ANNOUNCEMENT, DEFAULT_NO_ROUTE_MESSAGE},
    ApiKey, EmployeeId, RoutingPolicy,
};

const CONFIG_FILE: &str = "switchboard.toml";

/// Legacy environment names mapped onto config keys. These win over the
/// plain `API_KEY` / `WEBHOOK_SECRET` spellings.
const LEGACY_ENV_KEYS: &[(&str, &str)] =
    &[("FLASK_API_KEY", "api_key"), ("VAPI_WEBHOOK_SECRET", "webhook_secret")];

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`switchboard.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Environment keys are matched case-insensitively, so `PORT` sets `port`.
///
/// # Example
///
/// ```no_run
/// use switchboard_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    // Authentication
    /// Shared secret expected in `X-API-Key`. Unset means the development key.
    ///
    /// Environment variable: `FLASK_API_KEY`, or `API_KEY` when that is unset
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Secret the voice assistant sends in `X-Vapi-Secret` on tool calls.
    /// Unset means the development secret.
    ///
    /// Environment variable: `VAPI_WEBHOOK_SECRET`, or `WEBHOOK_SECRET`
    #[serde(default, skip_serializing)]
    pub webhook_secret: Option<String>,

    // Directory and routing
    /// Path of the employee directory JSON document.
    ///
    /// Environment variable: `DIRECTORY_PATH`
    #[serde(default = "default_directory_path")]
    pub directory_path: PathBuf,
    /// Text spoken before connecting a call.
    ///
    /// Environment variable: `ANNOUNCEMENT`
    #[serde(default = "default_announcement")]
    pub announcement: String,
    /// Text spoken when nobody can take the call.
    ///
    /// Environment variable: `NO_ROUTE_MESSAGE`
    #[serde(default = "default_no_route_message")]
    pub no_route_message: String,
    /// Employee that receives unmatched calls.
    ///
    /// Environment variable: `FALLBACK_EMPLOYEE_ID`
    #[serde(default)]
    pub fallback_employee_id: Option<u64>,

    // Logging
    /// Append-only JSON-lines transaction log.
    ///
    /// Environment variable: `TRANSACTION_LOG_PATH`
    #[serde(default = "default_transaction_log_path")]
    pub transaction_log_path: PathBuf,
    /// Log filter directives.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack used by [`Config::load`].
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""))
            .merge(Env::raw().only(&["FLASK_API_KEY", "VAPI_WEBHOOK_SECRET"]).map(|key| {
                LEGACY_ENV_KEYS
                    .iter()
                    .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                    .map_or_else(|| key.as_str().into(), |(_, field)| (*field).into())
            }))
    }

    /// Extracts and validates configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// The shared secret, falling back to the development key.
    pub fn api_key(&self) -> ApiKey {
        ApiKey::from_config(self.api_key.as_deref())
    }

    /// The tool-call secret, falling back to the development secret.
    pub fn webhook_secret(&self) -> ApiKey {
        ApiKey::webhook_secret_from_config(self.webhook_secret.as_deref())
    }

    /// Convert to the core routing policy.
    pub fn to_routing_policy(&self) -> RoutingPolicy {
        RoutingPolicy {
            announcement: self.announcement.clone(),
            no_route_message: self.no_route_message.clone(),
            fallback: self.fallback_employee_id.map(EmployeeId),
        }
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.announcement.trim().is_empty() {
            anyhow::bail!("announcement must not be empty");
        }

        if self.no_route_message.trim().is_empty() {
            anyhow::bail!("no_route_message must not be empty");
        }

        if self.directory_path.as_os_str().is_empty() {
            anyhow::bail!("directory_path must not be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            api_key: None,
            webhook_secret: None,
            directory_path: default_directory_path(),
            announcement: default_announcement(),
            no_route_message: default_no_route_message(),
            fallback_employee_id: None,
            transaction_log_path: default_transaction_log_path(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("company_directory.json")
}

fn default_announcement() -> String {
    DEFAULT_ANNOUNCEMENT.to_string()
}

fn default_no_route_message() -> String {
    DEFAULT_NO_ROUTE_MESSAGE.to_string()
}

fn default_transaction_log_path() -> PathBuf {
    PathBuf::from("transactions.log")
}

fn default_log_level() -> String {
    "info,switchboard=debug,tower_http=debug".to_string()
}
