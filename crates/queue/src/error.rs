use std::time::Duration;

use courier_core::error::CoreError;
use courier_core::types::DbId;

/// Errors surfaced by the queue's producer and worker operations.
///
/// `HandlerFailed`, `Cancelled` and `Timeout` are distinct on purpose: a
/// timeout says nothing about the job itself, which may still finish later.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The job id is unknown to the store (never existed or already purged).
    #[error("Command job {0} not found")]
    NotFound(DbId),

    /// The dispatcher has no handler registered for this tag.
    #[error("unknown command type: {0}")]
    UnknownCommandType(String),

    /// The handler ran and reported an error; `message` is the stored result.
    #[error("{message}")]
    HandlerFailed { job_id: DbId, message: String },

    /// The job was cancelled before it ran.
    #[error("Command job {job_id} was cancelled")]
    Cancelled { job_id: DbId },

    /// The waiter gave up; the job was left untouched.
    #[error("Timed out after {}ms waiting for command job {job_id}", .waited.as_millis())]
    Timeout { job_id: DbId, waited: Duration },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Startup validation found kinds without a handler.
    #[error("No handler registered for: {}", .0.join(", "))]
    MissingHandlers(Vec<String>),

    /// The row carries a status id this build does not know.
    #[error("Command job {job_id} has unknown status id {status_id}")]
    UnknownStatus { job_id: DbId, status_id: i16 },

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

impl From<CoreError> for QueueError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { id, .. } => QueueError::NotFound(id),
            CoreError::Validation(msg) => QueueError::Validation(msg),
            other => QueueError::Validation(other.to_string()),
        }
    }
}
