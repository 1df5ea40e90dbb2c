use std::sync::Arc;

use courier_queue::QueueContext;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the queue context and config sit behind `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Job store plus queue settings; producer operations hang off this.
    pub queue: QueueContext,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(queue: QueueContext, config: ServerConfig) -> Self {
        Self {
            queue,
            config: Arc::new(config),
        }
    }
}
