//! In-process [`JobStore`] with the same semantics as the PostgreSQL one.
//!
//! Only useful when producer and dispatcher share a process (tests, local
//! tooling); it is not durable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use super::JobStore;
use crate::models::command_job::{CommandJob, CommandJobFilter};
use crate::models::status::CommandStatus;

#[derive(Debug, Default)]
struct Inner {
    last_id: DbId,
    jobs: BTreeMap<DbId, CommandJob>,
}

/// Mutex-guarded map of jobs keyed by id.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: Mutex<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs, any status.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Move a job `from -> to` only if it is currently `from` and the
    /// lifecycle allows the edge. `apply` fills in the remaining columns.
    async fn transition(
        &self,
        id: DbId,
        from: CommandStatus,
        to: CommandStatus,
        apply: impl FnOnce(&mut CommandJob),
    ) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        let mut inner = self.inner.lock().await;
        match inner.jobs.get_mut(&id) {
            Some(job) if job.status_id == from.id() => {
                job.status_id = to.id();
                apply(job);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(
        &self,
        command_type: &str,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<CommandJob, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        let job = CommandJob {
            id: inner.last_id,
            command_type: command_type.to_string(),
            target_id: target_id.to_string(),
            parameters: parameters.cloned(),
            status_id: CommandStatus::Pending.id(),
            created_at: Utc::now(),
            claimed_at: None,
            executed_at: None,
            result: None,
            retry_count: 0,
            last_error: None,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: DbId) -> Result<Option<CommandJob>, sqlx::Error> {
        Ok(self.inner.lock().await.jobs.get(&id).cloned())
    }

    async fn update(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(false);
        };
        job.status_id = status.id();
        job.executed_at = Some(executed_at);
        job.result = result.map(str::to_string);
        Ok(true)
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<CommandJob>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut pending: Vec<CommandJob> = inner
            .jobs
            .values()
            .filter(|job| job.status_id == CommandStatus::Pending.id())
            .cloned()
            .collect();
        pending.sort_by_key(|job| (job.created_at, job.id));
        pending.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(pending)
    }

    async fn claim(&self, id: DbId, claimed_at: Timestamp) -> Result<bool, sqlx::Error> {
        Ok(self
            .transition(id, CommandStatus::Pending, CommandStatus::InProgress, |job| {
                job.claimed_at = Some(claimed_at);
            })
            .await)
    }

    async fn finish_claimed(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        Ok(self
            .transition(id, CommandStatus::InProgress, status, |job| {
                job.executed_at = Some(executed_at);
                job.result = result.map(str::to_string);
            })
            .await)
    }

    async fn cancel_pending(&self, id: DbId, executed_at: Timestamp) -> Result<bool, sqlx::Error> {
        Ok(self
            .transition(id, CommandStatus::Pending, CommandStatus::Cancelled, |job| {
                job.executed_at = Some(executed_at);
            })
            .await)
    }

    async fn fail_stale_claims(
        &self,
        claimed_before: Timestamp,
        executed_at: Timestamp,
        message: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let mut failed = Vec::new();
        for job in inner.jobs.values_mut() {
            let stale = job.status_id == CommandStatus::InProgress.id()
                && job.claimed_at.is_some_and(|at| at < claimed_before);
            if stale {
                job.status_id = CommandStatus::Failed.id();
                job.executed_at = Some(executed_at);
                job.result = Some(message.to_string());
                failed.push(job.id);
            }
        }
        Ok(failed)
    }

    async fn list(&self, filter: &CommandJobFilter) -> Result<Vec<CommandJob>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let offset = usize::try_from(filter.effective_offset()).unwrap_or(0);
        let limit = usize::try_from(filter.effective_limit()).unwrap_or(0);
        Ok(inner
            .jobs
            .values()
            .rev()
            .filter(|job| filter.status.map_or(true, |s| job.status_id == s.id()))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_terminal_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let before = inner.jobs.len();
        inner.jobs.retain(|_, job| {
            let expired = job.executed_at.is_some_and(|at| at < cutoff);
            !(job.is_terminal() && expired)
        });
        Ok((before - inner.jobs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
