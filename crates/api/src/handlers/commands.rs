//! Handlers for the `/commands` resource.
//!
//! The control process only ever writes `pending` rows and `cancelled`
//! transitions; execution belongs to the worker.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_core::commands::CommandKind;
use courier_core::error::CoreError;
use courier_core::types::DbId;
use courier_db::models::command_job::CommandJobListQuery;
use courier_queue::CancelOutcome;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

pub use courier_queue::config::MAX_WAIT_TIMEOUT_MS;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/commands`.
///
/// Length caps are enforced by the enqueuer; this only rejects empty fields.
#[derive(Debug, Deserialize, Validate)]
pub struct EnqueueCommand {
    #[validate(length(min = 1))]
    pub command_type: String,
    #[validate(length(min = 1))]
    pub target_id: String,
    pub parameters: Option<serde_json::Value>,
    /// When set, block until the job finishes or this many ms elapse.
    pub wait_timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EnqueuedCommand {
    pub job_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct ResultParams {
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CommandResult {
    pub job_id: DbId,
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct CancelledCommand {
    pub job_id: DbId,
    pub cancelled: bool,
}

/// Resolve a caller-supplied wait bound, falling back to `default`.
///
/// Both are held to [`MAX_WAIT_TIMEOUT_MS`]; an oversized request is a 400,
/// an oversized default is clamped.
fn wait_timeout(requested_ms: Option<u64>, default: Duration) -> AppResult<Duration> {
    match requested_ms {
        None => Ok(default.min(Duration::from_millis(MAX_WAIT_TIMEOUT_MS))),
        Some(ms) if ms > MAX_WAIT_TIMEOUT_MS => Err(AppError::BadRequest(format!(
            "wait timeout {ms}ms exceeds the maximum of {MAX_WAIT_TIMEOUT_MS}ms"
        ))),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/commands
///
/// Enqueue a command. Returns 201 with the job id, or, when
/// `wait_timeout_ms` is present, waits and returns 200 with the outcome.
pub async fn enqueue_command(
    State(state): State<AppState>,
    Json(input): Json<EnqueueCommand>,
) -> AppResult<Response> {
    input.validate()?;
    let kind: CommandKind = input.command_type.parse()?;
    // Reject a bad wait bound before anything is written.
    let timeout = input
        .wait_timeout_ms
        .map(|ms| wait_timeout(Some(ms), state.queue.config().default_wait_timeout))
        .transpose()?;

    let job_id = state
        .queue
        .enqueuer()
        .enqueue(&kind, &input.target_id, input.parameters.as_ref())
        .await?;

    let Some(timeout) = timeout else {
        let body = DataResponse {
            data: EnqueuedCommand { job_id },
        };
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    };

    let outcome = state.queue.waiter().wait_for_outcome(job_id, timeout).await?;
    Ok(Json(DataResponse { data: outcome }).into_response())
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/commands
///
/// Supports optional `status`, `limit`, and `offset` query parameters.
pub async fn list_commands(
    State(state): State<AppState>,
    Query(params): Query<CommandJobListQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = params.to_filter().map_err(AppError::BadRequest)?;
    let jobs = state.queue.store().list(&filter).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/commands/{id}
pub async fn get_command(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .queue
        .store()
        .get(job_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "CommandJob",
            id: job_id,
        })?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/commands/{id}/result?timeout_ms=
///
/// Wait for the job to finish. 504 if it is still running at the deadline,
/// 422 if its handler failed, 409 if it was cancelled.
pub async fn wait_for_result(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Query(params): Query<ResultParams>,
) -> AppResult<impl IntoResponse> {
    let timeout = wait_timeout(params.timeout_ms, state.queue.config().default_wait_timeout)?;
    let result = state.queue.waiter().wait_for_result(job_id, timeout).await?;
    Ok(Json(DataResponse {
        data: CommandResult { job_id, result },
    }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/commands/{id}/cancel
///
/// Returns 409 if the job has already left `pending`.
pub async fn cancel_command(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    match state.queue.canceller().cancel(job_id).await? {
        CancelOutcome::Cancelled => Ok(Json(DataResponse {
            data: CancelledCommand {
                job_id,
                cancelled: true,
            },
        })),
        CancelOutcome::NotPending(status) => Err(AppError::Core(CoreError::Conflict(format!(
            "Command job {job_id} is {status} and can no longer be cancelled"
        )))),
    }
}
