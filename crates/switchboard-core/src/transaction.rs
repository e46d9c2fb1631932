//! Append-only transaction log of handled requests.
//!
//! Every request that reaches a routing endpoint produces one
//! [`TransactionRecord`]: when it arrived, what was sent, what was decided
//! and what was returned. Sinks implement [`TransactionLog`]; recording is
//! best-effort and a failing sink never fails the request.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::warn;

use crate::models::EmployeeId;

/// Result of one request, as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Call connected to an employee
    Routed {
        /// Selected employee
        employee_id: EmployeeId,
        /// Whether the fallback employee was used
        fallback: bool,
    },
    /// No employee could take the call
    NoRoute,
    /// Credential missing or wrong
    Unauthorized {
        /// Whether an `X-API-Key` header was sent
        header_present: bool,
    },
    /// Body could not be used
    Malformed {
        /// What was wrong with it
        reason: String,
    },
    /// A non-routing request was accepted (transfer acknowledgements)
    Accepted,
    /// Unexpected server-side failure
    Internal,
}

impl Outcome {
    /// The matched employee, when the call was routed.
    pub fn employee_id(&self) -> Option<EmployeeId> {
        match self {
            Self::Routed { employee_id, .. } => Some(*employee_id),
            _ => None,
        }
    }
}

/// One line of the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// When the request was handled
    pub timestamp: DateTime<Utc>,
    /// Request path, e.g. `/webhook`
    pub route: String,
    /// Correlation id from the `X-Request-Id` layer, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Inbound payload; `null` when it could not be parsed
    pub request: Value,
    /// What happened
    pub outcome: Outcome,
    /// HTTP status returned
    pub status: u16,
    /// Body returned
    pub response: Value,
}

/// Sink for transaction records.
///
/// Implementations must not block request handling for long and must swallow
/// their own failures after reporting them through `tracing`.
#[async_trait::async_trait]
pub trait TransactionLog: Send + Sync + std::fmt::Debug {
    /// Appends a record.
    async fn record(&self, record: TransactionRecord);
}

/// Discards all records.
#[derive(Debug, Default)]
pub struct NoOpTransactionLog;

#[async_trait::async_trait]
impl TransactionLog for NoOpTransactionLog {
    async fn record(&self, _record: TransactionRecord) {}
}

/// Appends records as JSON lines to a file.
///
/// Writes are serialized through a mutex so lines from concurrent requests
/// never interleave mid-line; their relative order is unspecified.
#[derive(Debug)]
pub struct FileTransactionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTransactionLog {
    /// Creates a sink appending to `path`. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Destination file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn append(&self, line: &[u8]) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line).await?;
        file.flush().await
    }
}

#[async_trait::async_trait]
impl TransactionLog for FileTransactionLog {
    async fn record(&self, record: TransactionRecord) {
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize transaction record");
                return;
            },
        };
        line.push(b'\n');

        if let Err(e) = self.append(&line).await {
            warn!(error = %e, path = %self.path.display(), "Failed to append transaction record");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(outcome: Outcome) -> TransactionRecord {
        TransactionRecord {
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            route: "/webhook".to_string(),
            request_id: None,
            request: json!({"department": "Sales"}),
            outcome,
            status: 200,
            response: json!([]),
        }
    }

    #[tokio::test]
    async fn file_log_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileTransactionLog::new(dir.path().join("transactions.log"));

        log.record(sample(Outcome::Routed { employee_id: EmployeeId(1), fallback: false })).await;
        log.record(sample(Outcome::NoRoute)).await;

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: TransactionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.outcome.employee_id(), Some(EmployeeId(1)));
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["outcome"]["kind"], "no_route");
    }

    #[tokio::test]
    async fn unwritable_log_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let log = FileTransactionLog::new(dir.path());

        log.record(sample(Outcome::Internal)).await;
    }
}
