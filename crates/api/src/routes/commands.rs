//! Route definitions for the `/commands` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::commands;
use crate::state::AppState;

/// Routes mounted at `/commands`.
///
/// ```text
/// GET    /                -> list_commands
/// POST   /                -> enqueue_command
/// GET    /{id}            -> get_command
/// GET    /{id}/result     -> wait_for_result
/// POST   /{id}/cancel     -> cancel_command
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(commands::list_commands).post(commands::enqueue_command))
        .route("/{id}", get(commands::get_command))
        .route("/{id}/result", get(commands::wait_for_result))
        .route("/{id}/cancel", post(commands::cancel_command))
}
