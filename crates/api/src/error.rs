use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_core::error::CoreError;
use courier_queue::QueueError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`QueueError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `courier_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the queue operations.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::from(errors))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Queue errors ---
            AppError::Queue(err) => classify_queue_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map a queue error onto an HTTP status.
///
/// A handler failure is reported as 422 with the stored message so callers
/// can tell it apart from a 504 wait timeout, which says nothing about the
/// job itself.
fn classify_queue_error(err: &QueueError) -> (StatusCode, &'static str, String) {
    match err {
        QueueError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        QueueError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        QueueError::UnknownCommandType(_) => {
            (StatusCode::BAD_REQUEST, "UNKNOWN_COMMAND_TYPE", err.to_string())
        }
        QueueError::HandlerFailed { message, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "COMMAND_FAILED",
            message.clone(),
        ),
        QueueError::Cancelled { .. } => (StatusCode::CONFLICT, "CANCELLED", err.to_string()),
        QueueError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", err.to_string()),
        QueueError::Store(db) => classify_sqlx_error(db),
        QueueError::MissingHandlers(_) | QueueError::UnknownStatus { .. } => {
            tracing::error!(error = %err, "Internal queue error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn queue_errors_map_to_distinct_statuses() {
        assert_eq!(status_of(QueueError::NotFound(1).into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(
                QueueError::Timeout {
                    job_id: 1,
                    waited: Duration::from_millis(10),
                }
                .into()
            ),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(
                QueueError::HandlerFailed {
                    job_id: 1,
                    message: "member not found".into(),
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(QueueError::Cancelled { job_id: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(QueueError::Validation("empty".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_failures_are_sanitized() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
