#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier_core::lifecycle::ClaimMode;
use courier_core::types::DbId;
use courier_db::models::command_job::CommandJob;
use courier_db::models::status::CommandStatus;
use courier_db::store::{JobStore, MemoryJobStore};
use courier_queue::{handler_fn, CommandHandler, HandlerError, QueueConfig, QueueContext};
use tokio::sync::{mpsc, Semaphore};

/// Short intervals so loop-driven tests finish quickly.
pub fn fast_config(claim_mode: ClaimMode) -> QueueConfig {
    QueueConfig {
        dispatch_interval: Duration::from_millis(10),
        wait_poll_interval: Duration::from_millis(5),
        default_wait_timeout: Duration::from_secs(2),
        claim_mode,
        shutdown_grace: Duration::from_millis(200),
        ..Default::default()
    }
}

/// A context over a fresh in-memory store.
pub fn memory_context(config: QueueConfig) -> (QueueContext, Arc<MemoryJobStore>) {
    let store = Arc::new(MemoryJobStore::new());
    let ctx = QueueContext::new(store.clone(), config);
    (ctx, store)
}

/// Returns the parameters back as a JSON string.
pub fn echo_handler() -> Arc<dyn CommandHandler> {
    handler_fn(|_target, params| async move {
        Ok(params.map(|p| p.to_string()).unwrap_or_default())
    })
}

/// Always fails with `message`.
pub fn failing_handler(message: &'static str) -> Arc<dyn CommandHandler> {
    handler_fn(move |_, _| async move { Err(HandlerError::new(message)) })
}

/// Never returns.
pub fn stuck_handler() -> Arc<dyn CommandHandler> {
    handler_fn(|_, _| std::future::pending::<Result<String, HandlerError>>())
}

/// A handler that reports each start and then blocks until released.
pub struct GatedHandler {
    pub calls: Arc<AtomicUsize>,
    pub started: mpsc::UnboundedReceiver<String>,
    pub release: Arc<Semaphore>,
    pub handler: Arc<dyn CommandHandler>,
}

impl GatedHandler {
    pub fn new() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Semaphore::new(0));
        let (tx, started) = mpsc::unbounded_channel();

        let handler = {
            let calls = calls.clone();
            let release = release.clone();
            handler_fn(move |target, _| {
                let calls = calls.clone();
                let release = release.clone();
                let tx = tx.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(target.clone());
                    let _permit = release
                        .acquire()
                        .await
                        .map_err(|e| HandlerError::new(e.to_string()))?;
                    Ok(format!("done:{target}"))
                }
            })
        };

        Self {
            calls,
            started,
            release,
            handler,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until the handler has been entered once more.
    pub async fn wait_started(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(2), self.started.recv())
            .await
            .expect("handler did not start in time")
            .expect("handler channel closed")
    }
}

pub async fn fetch(store: &dyn JobStore, id: DbId) -> CommandJob {
    store
        .get(id)
        .await
        .expect("store read failed")
        .expect("job should exist")
}

pub async fn status_of(store: &dyn JobStore, id: DbId) -> CommandStatus {
    fetch(store, id).await.status().expect("known status")
}
