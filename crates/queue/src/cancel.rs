//! Producer side: best-effort cancellation of a still-pending job.

use chrono::Utc;
use courier_core::types::DbId;
use courier_db::models::status::CommandStatus;

use crate::context::QueueContext;
use crate::error::QueueError;

/// What [`Canceller::cancel`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was `pending` and is now `cancelled`.
    Cancelled,
    /// The job had already left `pending`; it was not modified.
    NotPending(CommandStatus),
}

/// Marks pending jobs as cancelled.
///
/// The write is conditional on `status = pending`, but a dispatcher that
/// already listed the job in `best_effort` mode can still overwrite the
/// cancellation with its own outcome.
#[derive(Debug, Clone)]
pub struct Canceller {
    ctx: QueueContext,
}

impl Canceller {
    pub fn new(ctx: QueueContext) -> Self {
        Self { ctx }
    }

    pub async fn cancel(&self, job_id: DbId) -> Result<CancelOutcome, QueueError> {
        let store = self.ctx.store();

        if store.cancel_pending(job_id, Utc::now()).await? {
            tracing::info!(job_id, "Command cancelled");
            return Ok(CancelOutcome::Cancelled);
        }

        let job = store
            .get(job_id)
            .await?
            .ok_or(QueueError::NotFound(job_id))?;
        let status = job.status().ok_or(QueueError::UnknownStatus {
            job_id,
            status_id: job.status_id,
        })?;

        tracing::debug!(job_id, status = %status, "Cancel ignored, command no longer pending");
        Ok(CancelOutcome::NotPending(status))
    }
}
