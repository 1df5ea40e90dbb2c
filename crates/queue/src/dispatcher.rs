//! Worker-side dispatcher loop.
//!
//! Polls for pending jobs every `dispatch_interval` and runs each one on its
//! own Tokio task; a tick never waits for the handlers it started. With
//! [`ClaimMode::Enforced`] the tick claims each listed job
//! (`pending -> in_progress`) one at a time, oldest first, before spawning
//! its handler, so overlapping ticks or several dispatchers cannot run it
//! twice. Claims whose worker never recorded an outcome are failed once they
//! are older than `stale_claim_timeout`. With [`ClaimMode::BestEffort`] there
//! is no claim step: a job whose handler outlives the interval is picked up
//! again by the next tick.

use std::sync::Arc;

use chrono::Utc;
use courier_core::lifecycle::ClaimMode;
use courier_db::models::command_job::CommandJob;
use courier_db::models::status::CommandStatus;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::STALE_CLAIM_MESSAGE;
use crate::context::QueueContext;
use crate::error::QueueError;
use crate::registry::HandlerRegistry;

/// Stored when a handler panics instead of returning.
const PANIC_MESSAGE: &str = "handler panicked";

/// Background command dispatcher.
///
/// A single long-lived task per worker process.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: QueueContext,
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(ctx: QueueContext, registry: Arc<HandlerRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// Run the dispatcher loop until the cancellation token is triggered,
    /// then give in-flight handlers `shutdown_grace` to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let config = self.ctx.config();
        let mut ticker = tokio::time::interval(config.dispatch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        tracing::info!(
            poll_interval_ms = config.dispatch_interval.as_millis() as u64,
            claim_mode = %config.claim_mode,
            handlers = self.registry.len(),
            "Command dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Command dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    reap_finished(&mut in_flight);
                    if let Err(e) = self.tick(&mut in_flight).await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }

        self.drain(in_flight).await;
    }

    /// One dispatch cycle: fail stale claims, list pending jobs, claim them
    /// in creation order (if enforced) and spawn a task per job.
    ///
    /// Returns the number of tasks spawned.
    pub async fn tick(&self, in_flight: &mut JoinSet<()>) -> Result<usize, QueueError> {
        if let Err(e) = self.recover_stale_claims().await {
            tracing::error!(error = %e, "Stale claim recovery failed");
        }

        let store = self.ctx.store();
        let mode = self.ctx.config().claim_mode;
        let pending = store
            .list_pending(self.ctx.config().dispatch_batch_size)
            .await?;

        if pending.is_empty() {
            return Ok(0);
        }
        tracing::debug!(count = pending.len(), "Dispatching pending commands");

        let mut spawned = 0;
        for job in pending {
            if mode == ClaimMode::Enforced && !store.claim(job.id, Utc::now()).await? {
                tracing::debug!(job_id = job.id, "Command already claimed or cancelled, skipping");
                continue;
            }
            let ctx = self.ctx.clone();
            let registry = Arc::clone(&self.registry);
            in_flight.spawn(async move {
                let job_id = job.id;
                if let Err(e) = execute_job(&ctx, &registry, job).await {
                    tracing::error!(job_id, error = %e, "Failed to record command outcome");
                }
            });
            spawned += 1;
        }
        Ok(spawned)
    }

    /// Fail `in_progress` jobs claimed longer than `stale_claim_timeout` ago.
    ///
    /// Such a claim belongs to a worker that crashed or abandoned its handler
    /// at shutdown. Returns the number of jobs failed.
    pub async fn recover_stale_claims(&self) -> Result<usize, QueueError> {
        let Some(timeout) = self.ctx.config().stale_claim_timeout else {
            return Ok(0);
        };
        let now = Utc::now();
        let Some(cutoff) = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let failed = self
            .ctx
            .store()
            .fail_stale_claims(cutoff, now, STALE_CLAIM_MESSAGE)
            .await?;
        if !failed.is_empty() {
            tracing::warn!(
                job_ids = ?failed,
                stale_after_secs = timeout.as_secs(),
                "Failed stale command claims",
            );
        }
        Ok(failed.len())
    }

    /// Run a single tick and wait for every handler it started.
    pub async fn run_once(&self) -> Result<usize, QueueError> {
        let mut in_flight = JoinSet::new();
        let spawned = self.tick(&mut in_flight).await?;
        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }
        Ok(spawned)
    }

    async fn drain(&self, mut in_flight: JoinSet<()>) {
        if in_flight.is_empty() {
            return;
        }
        let grace = self.ctx.config().shutdown_grace;
        tracing::info!(
            in_flight = in_flight.len(),
            grace_secs = grace.as_secs(),
            "Waiting for in-flight commands",
        );

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = in_flight.join_next().await {
                log_join_error(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                abandoned = in_flight.len(),
                "Shutdown grace elapsed, abandoning in-flight commands",
            );
            in_flight.abort_all();
            // Wait for the aborts so every handler is stopped before returning.
            while in_flight.join_next().await.is_some() {}
        }
    }
}

/// Aborts the wrapped task when dropped.
///
/// The handler runs on its own task so a panic stays contained; without this
/// guard, aborting the dispatcher's task would leave the handler running
/// with nobody to record its outcome.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run the handler for an already-claimed (or best-effort) job and record
/// the outcome.
async fn execute_job(
    ctx: &QueueContext,
    registry: &HandlerRegistry,
    job: CommandJob,
) -> Result<(), QueueError> {
    let store = ctx.store();
    let mode = ctx.config().claim_mode;

    let kind = job.kind();
    let outcome = match registry.resolve(&kind) {
        Ok(handler) => {
            tracing::info!(
                job_id = job.id,
                command_type = %kind,
                target_id = %job.target_id,
                "Executing command",
            );
            let target_id = job.target_id.clone();
            let parameters = job.parameters.clone();
            let mut task = AbortOnDrop(tokio::spawn(async move {
                handler.execute(&target_id, parameters.as_ref()).await
            }));
            let joined = (&mut task.0).await;
            match joined {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(e)) => Err(e.to_string()),
                Err(join) if join.is_panic() => Err(PANIC_MESSAGE.to_string()),
                Err(_) => Err("handler task was cancelled".to_string()),
            }
        }
        Err(e) => Err(e.to_string()),
    };

    let (status, result) = match outcome {
        Ok(result) => {
            tracing::info!(job_id = job.id, command_type = %kind, "Command completed");
            (CommandStatus::Completed, result)
        }
        Err(message) => {
            tracing::warn!(
                job_id = job.id,
                command_type = %kind,
                error = %message,
                "Command failed",
            );
            (CommandStatus::Failed, message)
        }
    };

    let executed_at = Utc::now();
    let recorded = match mode {
        ClaimMode::Enforced => {
            store
                .finish_claimed(job.id, status, executed_at, Some(&result))
                .await?
        }
        ClaimMode::BestEffort => {
            store
                .update(job.id, status, executed_at, Some(&result))
                .await?
        }
    };

    if !recorded {
        tracing::warn!(
            job_id = job.id,
            status = %status,
            "Command outcome not recorded, job no longer exists or changed state",
        );
    }
    Ok(())
}

/// Collect tasks that already finished so the set does not grow unbounded.
fn reap_finished(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        log_join_error(joined);
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Command task panicked");
        }
    }
}
