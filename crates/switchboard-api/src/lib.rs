//! HTTP surface of the switchboard call router.
//!
//! Exposes the call webhook, the assistant tool-call endpoint, the transfer
//! acknowledgement, and health probes over Axum.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::{create_router, serve, start_server, RequestId};
pub use state::AppState;
