//! Repository for the `command_jobs` table.
//!
//! Uses [`CommandStatus`] for every status literal. Writes that leave
//! `pending` come in two flavours: the unconditional [`CommandJobRepo::update`]
//! and the conditional `claim` / `finish_claimed` / `cancel_pending` /
//! `fail_stale_claims`, which only touch the row when it is still in the
//! expected status.

use courier_core::lifecycle::status_ids;
use courier_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::command_job::{CommandJob, CommandJobFilter};
use crate::models::status::{CommandStatus, StatusId};

/// Column list for `command_jobs` queries.
const COLUMNS: &str = "\
    id, command_type, target_id, parameters, status_id, \
    created_at, claimed_at, executed_at, result, \
    retry_count, last_error";

/// Provides CRUD operations for command jobs.
pub struct CommandJobRepo;

impl CommandJobRepo {
    /// Insert a new pending job and return the stored row.
    pub async fn create(
        pool: &PgPool,
        command_type: &str,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<CommandJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO command_jobs (command_type, target_id, parameters, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommandJob>(&query)
            .bind(command_type)
            .bind(target_id)
            .bind(parameters)
            .bind(CommandStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CommandJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM command_jobs WHERE id = $1");
        sqlx::query_as::<_, CommandJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write an outcome without checking the current status.
    ///
    /// Last write wins: a concurrent cancel or a second execution of the
    /// same job can overwrite each other. Returns `false` if the row is gone.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE command_jobs \
             SET status_id = $2, executed_at = $3, result = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.id())
        .bind(executed_at)
        .bind(result)
        .execute(pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Pending jobs in creation order, oldest first.
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<CommandJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM command_jobs \
             WHERE status_id = $1 \
             ORDER BY created_at ASC, id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, CommandJob>(&query)
            .bind(CommandStatus::Pending.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Atomically move a job from `pending` to `in_progress`.
    ///
    /// Returns `false` if another dispatcher claimed it first or it was
    /// cancelled in the meantime.
    pub async fn claim(pool: &PgPool, id: DbId, claimed_at: Timestamp) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE command_jobs \
             SET status_id = $2, claimed_at = $3 \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(CommandStatus::InProgress.id())
        .bind(claimed_at)
        .bind(CommandStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Record the outcome of a claimed job. No-op unless still `in_progress`
    /// and `status` is a legal successor of it.
    pub async fn finish_claimed(
        pool: &PgPool,
        id: DbId,
        status: CommandStatus,
        executed_at: Timestamp,
        result: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        if !CommandStatus::InProgress.can_transition_to(status) {
            return Ok(false);
        }
        let done = sqlx::query(
            "UPDATE command_jobs \
             SET status_id = $2, executed_at = $3, result = $4 \
             WHERE id = $1 AND status_id = $5",
        )
        .bind(id)
        .bind(status.id())
        .bind(executed_at)
        .bind(result)
        .bind(CommandStatus::InProgress.id())
        .execute(pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Cancel a job only if it is still `pending`.
    pub async fn cancel_pending(
        pool: &PgPool,
        id: DbId,
        executed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE command_jobs \
             SET status_id = $2, executed_at = $3 \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(CommandStatus::Cancelled.id())
        .bind(executed_at)
        .bind(CommandStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Fail every `in_progress` job claimed before `claimed_before`.
    ///
    /// A worker that crashed, or abandoned a handler at shutdown, never
    /// records an outcome for its claims. Returns the ids that were failed.
    pub async fn fail_stale_claims(
        pool: &PgPool,
        claimed_before: Timestamp,
        executed_at: Timestamp,
        message: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "UPDATE command_jobs \
             SET status_id = $1, executed_at = $2, result = $3 \
             WHERE status_id = $4 AND claimed_at < $5 \
             RETURNING id",
        )
        .bind(CommandStatus::Failed.id())
        .bind(executed_at)
        .bind(message)
        .bind(CommandStatus::InProgress.id())
        .bind(claimed_before)
        .fetch_all(pool)
        .await
    }

    /// List jobs newest first with an optional status filter and pagination.
    pub async fn list(
        pool: &PgPool,
        filter: &CommandJobFilter,
    ) -> Result<Vec<CommandJob>, sqlx::Error> {
        let where_clause = if filter.status.is_some() {
            "WHERE status_id = $3"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM command_jobs \
             {where_clause} \
             ORDER BY id DESC \
             LIMIT $1 OFFSET $2"
        );

        let mut q = sqlx::query_as::<_, CommandJob>(&query)
            .bind(filter.effective_limit())
            .bind(filter.effective_offset());
        if let Some(status) = filter.status {
            q = q.bind(status.id());
        }
        q.fetch_all(pool).await
    }

    /// Delete terminal jobs whose `executed_at` is older than `cutoff`.
    pub async fn delete_terminal_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let terminal: Vec<StatusId> = status_ids::TERMINAL.to_vec();
        let done = sqlx::query(
            "DELETE FROM command_jobs \
             WHERE status_id = ANY($1) AND executed_at < $2",
        )
        .bind(terminal)
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }
}
