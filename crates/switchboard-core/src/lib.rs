//! Core domain types for the switchboard call router.
//!
//! Provides the read-only employee directory, routing selection with its
//! fallback policy, API key verification, the transaction log, and the error
//! taxonomy shared by the HTTP layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod directory;
pub mod error;
pub mod models;
pub mod routing;
pub mod time;
pub mod transaction;

pub use auth::{
    ApiKey, API_KEY_HEADER, DEVELOPMENT_API_KEY, DEVELOPMENT_WEBHOOK_SECRET, WEBHOOK_SECRET_HEADER,
};
pub use directory::Directory;
pub use error::{Result, RouterError};
pub use models::{
    Action, ActionScript, CallEndpoint, EmployeeId, EmployeeRecord, RoutingKey, WebhookRequest,
};
pub use routing::{MatchSource, RouteDecision, Router, RoutingPolicy};
pub use time::{Clock, RealClock, TestClock};
pub use transaction::{
    FileTransactionLog, NoOpTransactionLog, Outcome, TransactionLog,
    TransactionRecord,
};
