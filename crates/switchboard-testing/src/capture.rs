//! In-memory transaction log for asserting on recorded exchanges.

use std::sync::{Arc, Mutex};

use switchboard_core::{Outcome, TransactionLog, TransactionRecord};

/// Collects transaction records in memory.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// application state owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionLog {
    records: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl MemoryTransactionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in arrival order.
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }

    /// Records for one route.
    pub fn records_for(&self, route: &str) -> Vec<TransactionRecord> {
        self.records().into_iter().filter(|r| r.route == route).collect()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<TransactionRecord> {
        self.records.lock().ok().and_then(|records| records.last().cloned())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records whose outcome routed a call.
    pub fn routed_count(&self) -> usize {
        self.records().iter().filter(|r| matches!(r.outcome, Outcome::Routed { .. })).count()
    }

    /// Drops all records.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

#[async_trait::async_trait]
impl TransactionLog for MemoryTransactionLog {
    async fn record(&self, record: TransactionRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use switchboard_core::EmployeeId;

    use super::*;

    fn record(route: &str, outcome: Outcome) -> TransactionRecord {
        TransactionRecord {
            timestamp: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            route: route.to_string(),
            request_id: None,
            request: json!({}),
            outcome,
            status: 200,
            response: json!([]),
        }
    }

    #[tokio::test]
    async fn clones_share_records() {
        let log = MemoryTransactionLog::new();
        let handle = log.clone();

        log.record(record("/webhook", Outcome::Routed { employee_id: EmployeeId(1), fallback: false }))
            .await;
        log.record(record("/transfer", Outcome::Accepted)).await;

        assert_eq!(handle.len(), 2);
        assert_eq!(handle.routed_count(), 1);
        assert_eq!(handle.records_for("/transfer").len(), 1);

        handle.clear();
        assert!(log.is_empty());
    }
}
