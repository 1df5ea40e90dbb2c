//! Producer side: create a pending job.

use courier_core::commands::{validate_command_type, validate_target_id, CommandKind};
use courier_core::types::DbId;

use crate::context::QueueContext;
use crate::error::QueueError;

/// Creates command jobs for the worker to pick up.
#[derive(Debug, Clone)]
pub struct Enqueuer {
    ctx: QueueContext,
}

impl Enqueuer {
    pub fn new(ctx: QueueContext) -> Self {
        Self { ctx }
    }

    /// Persist one `pending` job and return its id.
    ///
    /// `parameters` is stored as-is and never interpreted by the queue.
    /// Fails on an empty tag or target, or when the store errors.
    pub async fn enqueue(
        &self,
        kind: &CommandKind,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<DbId, QueueError> {
        validate_command_type(kind.as_str())?;
        validate_target_id(target_id)?;

        let job = self
            .ctx
            .store()
            .create(kind.as_str(), target_id, parameters)
            .await?;

        tracing::info!(
            job_id = job.id,
            command_type = %kind,
            target_id,
            "Command enqueued",
        );

        Ok(job.id)
    }
}
