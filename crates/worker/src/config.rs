use courier_core::env::parse_or;
use courier_core::error::CoreError;
use courier_queue::{QueueConfig, RetentionConfig};

/// Everything the worker binary reads from the environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub queue: QueueConfig,
    pub retention: RetentionConfig,
    /// Refuse to start unless every well-known command kind has a handler.
    pub require_all_handlers: bool,
}

impl WorkerConfig {
    /// Load the queue and retention settings plus
    /// `REQUIRE_ALL_HANDLERS` (default `false`).
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            queue: QueueConfig::from_env()?,
            retention: RetentionConfig::from_env()?,
            require_all_handlers: parse_or("REQUIRE_ALL_HANDLERS", false)?,
        })
    }
}
