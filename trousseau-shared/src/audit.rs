/// Fire-and-forget audit sink
///
/// Every mutating operation reports its action name and the relevant
/// identifiers to an audit collaborator. Recording is best-effort: a sink
/// must never fail the operation that triggered it, which the trait encodes
/// by returning nothing.
///
/// # Example
///
/// ```
/// use trousseau_shared::audit::{AuditSink, TracingAuditSink};
/// use serde_json::json;
///
/// # async fn example() {
/// let sink = TracingAuditSink;
/// sink.record("KEY_CREATE", json!({ "key_id": 10, "company_id": 2 }))
///     .await;
/// # }
/// ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Audit collaborator interface
///
/// Implementations receive an action name (e.g. `COMPANY_CREATE`,
/// `KEY_SHARE_UPDATE`) and a structured detail payload.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records a single audit entry. Infallible by contract.
    async fn record(&self, action: &str, details: JsonValue);
}

/// Audit sink that emits entries as structured tracing events
///
/// Entries are logged under the `audit` target so they can be routed or
/// filtered independently of application logs (`RUST_LOG=audit=info`).
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, action: &str, details: JsonValue) {
        tracing::info!(target: "audit", action, %details, "audit entry");
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory sink for asserting audit behavior in tests.

    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MemoryAuditSink {
        pub entries: Mutex<Vec<(String, JsonValue)>>,
    }

    #[async_trait]
    impl AuditSink for MemoryAuditSink {
        async fn record(&self, action: &str, details: JsonValue) {
            self.entries
                .lock()
                .expect("audit entries lock poisoned")
                .push((action.to_string(), details));
        }
    }
}
