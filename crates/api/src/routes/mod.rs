pub mod commands;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /commands                      list, enqueue
/// /commands/{id}                 get
/// /commands/{id}/result          wait for result
/// /commands/{id}/cancel          cancel (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/commands", commands::router())
}
