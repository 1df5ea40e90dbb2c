//! Producer side: bounded wait for a job to reach a terminal status.
//!
//! This is a cooperative poll, not a notification: the job is re-read every
//! `wait_poll_interval`, so observed latency is bounded below by that
//! interval. A timeout leaves the job untouched; it may still complete later
//! with nobody listening.

use std::time::Duration;

use courier_core::types::DbId;
use courier_db::models::status::CommandStatus;
use serde::Serialize;
use tokio::time::Instant;

use crate::context::QueueContext;
use crate::error::QueueError;

/// Why a wait did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    HandlerFailed,
    Timeout,
    Cancelled,
    NotFound,
}

impl QueueError {
    /// The outcome kind for errors that describe the job rather than the
    /// store. `None` for storage and configuration errors.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            QueueError::HandlerFailed { .. } => Some(FailureKind::HandlerFailed),
            QueueError::Timeout { .. } => Some(FailureKind::Timeout),
            QueueError::Cancelled { .. } => Some(FailureKind::Cancelled),
            QueueError::NotFound(_) => Some(FailureKind::NotFound),
            _ => None,
        }
    }
}

/// Serializable success/failure envelope for a finished wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub job_id: DbId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl CommandOutcome {
    pub fn success(job_id: DbId, result: String) -> Self {
        Self {
            job_id,
            success: true,
            result: Some(result),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(job_id: DbId, kind: FailureKind, error: String) -> Self {
        Self {
            job_id,
            success: false,
            result: None,
            error: Some(error),
            error_kind: Some(kind),
        }
    }
}

/// Re-reads a job until it is terminal or the caller's bound elapses.
#[derive(Debug, Clone)]
pub struct ResultWaiter {
    ctx: QueueContext,
}

impl ResultWaiter {
    pub fn new(ctx: QueueContext) -> Self {
        Self { ctx }
    }

    /// Wait up to `timeout` for `job_id` to finish.
    ///
    /// - `completed` returns the stored result.
    /// - `failed` returns [`QueueError::HandlerFailed`] with the stored message.
    /// - `cancelled` returns [`QueueError::Cancelled`].
    /// - still `pending` / `in_progress` at the deadline returns
    ///   [`QueueError::Timeout`].
    pub async fn wait_for_result(&self, job_id: DbId, timeout: Duration) -> Result<String, QueueError> {
        let poll_interval = self.ctx.config().wait_poll_interval;
        let deadline = Instant::now() + timeout;

        loop {
            let job = self
                .ctx
                .store()
                .get(job_id)
                .await?
                .ok_or(QueueError::NotFound(job_id))?;

            match job.status() {
                Some(CommandStatus::Completed) => {
                    return Ok(job.result.unwrap_or_default());
                }
                Some(CommandStatus::Failed) => {
                    return Err(QueueError::HandlerFailed {
                        job_id,
                        message: job.result.unwrap_or_default(),
                    });
                }
                Some(CommandStatus::Cancelled) => {
                    return Err(QueueError::Cancelled { job_id });
                }
                Some(CommandStatus::Pending | CommandStatus::InProgress) => {}
                None => {
                    return Err(QueueError::UnknownStatus {
                        job_id,
                        status_id: job.status_id,
                    });
                }
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(
                    job_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Gave up waiting for command result",
                );
                return Err(QueueError::Timeout {
                    job_id,
                    waited: timeout,
                });
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// [`wait_for_result`](Self::wait_for_result) folded into a
    /// [`CommandOutcome`]. Only storage errors are returned as `Err`.
    pub async fn wait_for_outcome(
        &self,
        job_id: DbId,
        timeout: Duration,
    ) -> Result<CommandOutcome, QueueError> {
        match self.wait_for_result(job_id, timeout).await {
            Ok(result) => Ok(CommandOutcome::success(job_id, result)),
            Err(err) => match err.failure_kind() {
                Some(kind) => Ok(CommandOutcome::failure(job_id, kind, err.to_string())),
                None => Err(err),
            },
        }
    }
}
