//! Explicit context object replacing process-wide store handles.

use std::sync::Arc;

use courier_db::store::{JobStore, PgJobStore};
use courier_db::DbPool;

use crate::cancel::Canceller;
use crate::config::QueueConfig;
use crate::enqueue::Enqueuer;
use crate::waiter::ResultWaiter;

/// The store plus the queue settings, built once per process and handed to
/// every producer and dispatcher component.
///
/// Cheaply cloneable (everything is behind `Arc`).
#[derive(Clone)]
pub struct QueueContext {
    store: Arc<dyn JobStore>,
    config: Arc<QueueConfig>,
}

impl QueueContext {
    pub fn new(store: Arc<dyn JobStore>, config: QueueConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Context backed by the shared PostgreSQL table.
    pub fn postgres(pool: DbPool, config: QueueConfig) -> Self {
        Self::new(Arc::new(PgJobStore::new(pool)), config)
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn enqueuer(&self) -> Enqueuer {
        Enqueuer::new(self.clone())
    }

    pub fn waiter(&self) -> ResultWaiter {
        ResultWaiter::new(self.clone())
    }

    pub fn canceller(&self) -> Canceller {
        Canceller::new(self.clone())
    }
}

impl std::fmt::Debug for QueueContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
