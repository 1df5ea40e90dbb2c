//! The job store seam.
//!
//! Producers and the dispatcher never touch SQL directly; they hold an
//! `Arc<dyn JobStore>`. No isolation is assumed between `list_pending` and
//! concurrent writes, so callers must tolerate observing a job mid-transition.

use async_trait::async_trait;
use courier_core::types::{DbId, Timestamp};

use crate::models::command_job::{CommandJob, CommandJobFilter};
use crate::models::status::CommandStatus;
use crate::repositories::CommandJobRepo;
use crate::DbPool;

pub mod memory;

pub use memory::MemoryJobStore;

/// Durable storage for command jobs.
///
/// Every error is a storage error and is propagated unmodified. A missing
/// row is not an error: `get` returns `None` and the write operations
/// return `false`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a `pending` job. Ids are strictly increasing.
    async fn create(
        &self,
        command_type: &str,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<CommandJob, sqlx::Error>;

    async fn get(&self, id: DbId) -> Result<Option<CommandJob>, sqlx::Error>;

    /// Unconditional outcome write (last write wins).
    async fn update(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error>;

    /// Up to `limit` pending jobs, oldest first.
    async fn list_pending(&self, limit: i64) -> Result<Vec<CommandJob>, sqlx::Error>;

    /// Conditional `pending -> in_progress`.
    async fn claim(&self, id: DbId, claimed_at: Timestamp) -> Result<bool, sqlx::Error>;

    /// Conditional `in_progress -> status`.
    async fn finish_claimed(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error>;

    /// Conditional `pending -> cancelled`.
    async fn cancel_pending(&self, id: DbId, executed_at: Timestamp) -> Result<bool, sqlx::Error>;

    /// Conditional `in_progress -> failed` for claims older than
    /// `claimed_before`, storing `message` as the result. Returns the ids.
    async fn fail_stale_claims(
        &self,
        claimed_before: Timestamp,
        executed_at: Timestamp,
        message: &str,
    ) -> Result<Vec<DbId>, sqlx::Error>;

    /// Newest first, filtered and paginated.
    async fn list(&self, filter: &CommandJobFilter) -> Result<Vec<CommandJob>, sqlx::Error>;

    /// Delete terminal jobs executed before `cutoff`. Returns the count.
    async fn delete_terminal_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed [`JobStore`] delegating to [`CommandJobRepo`].
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(
        &self,
        command_type: &str,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<CommandJob, sqlx::Error> {
        CommandJobRepo::create(&self.pool, command_type, target_id, parameters).await
    }

    async fn get(&self, id: DbId) -> Result<Option<CommandJob>, sqlx::Error> {
        CommandJobRepo::find_by_id(&self.pool, id).await
    }

    async fn update(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        CommandJobRepo::update(&self.pool, id, status, executed_at, result).await
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<CommandJob>, sqlx::Error> {
        CommandJobRepo::list_pending(&self.pool, limit).await
    }

    async fn claim(&self, id: DbId, claimed_at: Timestamp) -> Result<bool, sqlx::Error> {
        CommandJobRepo::claim(&self.pool, id, claimed_at).await
    }

    async fn finish_claimed(
        &self,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        CommandJobRepo::finish_claimed(&self.pool, id, status, executed_at, result).await
    }

    async fn cancel_pending(&self, id: DbId, executed_at: Timestamp) -> Result<bool, sqlx::Error> {
        CommandJobRepo::cancel_pending(&self.pool, id, executed_at).await
    }

    async fn fail_stale_claims(
        &self,
        claimed_before: Timestamp,
        executed_at: Timestamp,
        message: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        CommandJobRepo::fail_stale_claims(&self.pool, claimed_before, executed_at, message).await
    }

    async fn list(&self, filter: &CommandJobFilter) -> Result<Vec<CommandJob>, sqlx::Error> {
        CommandJobRepo::list(&self.pool, filter).await
    }

    async fn delete_terminal_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        CommandJobRepo::delete_terminal_before(&self.pool, cutoff).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}
