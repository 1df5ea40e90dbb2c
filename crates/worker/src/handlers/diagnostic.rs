//! `DIAGNOSTIC`: report worker liveness back to the producer.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use courier_queue::{CommandHandler, HandlerError};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DiagnosticReport<'a> {
    target_id: &'a str,
    worker_version: &'static str,
    uptime_secs: u64,
    checked_at: String,
}

/// Answers with a JSON report; the `target_id` is echoed so a producer can
/// correlate the reply with whatever it was probing.
pub struct DiagnosticHandler {
    started_at: Instant,
}

impl DiagnosticHandler {
    pub fn new(started_at: Instant) -> Self {
        Self { started_at }
    }
}

#[async_trait]
impl CommandHandler for DiagnosticHandler {
    async fn execute(
        &self,
        target_id: &str,
        _parameters: Option<&serde_json::Value>,
    ) -> Result<String, HandlerError> {
        let report = DiagnosticReport {
            target_id,
            worker_version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.started_at.elapsed().as_secs(),
            checked_at: Utc::now().to_rfc3339(),
        };
        serde_json::to_string(&report)
            .map_err(|e| HandlerError::new(format!("failed to encode diagnostic report: {e}")))
    }
}

pub fn handler(started_at: Instant) -> Arc<dyn CommandHandler> {
    Arc::new(DiagnosticHandler::new(started_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_version_and_target() {
        let result = DiagnosticHandler::new(Instant::now())
            .execute("guild-1", None)
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(report["target_id"], "guild-1");
        assert_eq!(report["worker_version"], env!("CARGO_PKG_VERSION"));
        assert!(report["uptime_secs"].is_u64());
        assert!(report["checked_at"].is_string());
    }
}
