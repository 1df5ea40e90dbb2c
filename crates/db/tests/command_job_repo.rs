//! Integration tests for the `command_jobs` repository.
//!
//! Exercises the full repository layer against a real database:
//! - Insert defaults and id ordering
//! - Pending scan order
//! - Conditional claim / finish / cancel transitions
//! - Stale-claim recovery
//! - Unconditional update (last write wins)
//! - Retention delete

use chrono::{Duration, Utc};
use courier_db::models::command_job::CommandJobFilter;
use courier_db::models::status::CommandStatus;
use courier_db::repositories::CommandJobRepo;
use courier_db::store::{JobStore, PgJobStore};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn status_lookup_is_seeded(pool: PgPool) {
    courier_db::health_check(&pool).await.unwrap();

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM command_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    let expected = [
        CommandStatus::Pending,
        CommandStatus::InProgress,
        CommandStatus::Completed,
        CommandStatus::Failed,
        CommandStatus::Cancelled,
    ];
    assert_eq!(rows.len(), expected.len());
    for ((id, name), status) in rows.into_iter().zip(expected) {
        assert_eq!(id, status.id());
        assert_eq!(name, status.name());
    }
}

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_starts_pending_with_reserved_fields_untouched(pool: PgPool) {
    let params = json!({"reason": "spam"});
    let job = CommandJobRepo::create(&pool, "KICK_USER", "12345", Some(&params))
        .await
        .unwrap();

    assert_eq!(job.status(), Some(CommandStatus::Pending));
    assert_eq!(job.command_type, "KICK_USER");
    assert_eq!(job.target_id, "12345");
    assert_eq!(job.parameters, Some(params));
    assert!(job.executed_at.is_none());
    assert!(job.claimed_at.is_none());
    assert!(job.result.is_none());
    assert_eq!(job.retry_count, 0);
    assert!(job.last_error.is_none());

    let found = CommandJobRepo::find_by_id(&pool, job.id).await.unwrap();
    assert_eq!(found.map(|j| j.id), Some(job.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_accepts_absent_parameters(pool: PgPool) {
    let job = CommandJobRepo::create(&pool, "DIAGNOSTIC", "worker", None)
        .await
        .unwrap();
    assert!(job.parameters.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_target_is_rejected_by_schema(pool: PgPool) {
    let result = CommandJobRepo::create(&pool, "KICK_USER", "  ", None).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn find_missing_returns_none(pool: PgPool) {
    assert!(CommandJobRepo::find_by_id(&pool, 424242).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_creates_get_distinct_ids(pool: PgPool) {
    let store = PgJobStore::new(pool);
    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create("TEST", &format!("t{i}"), None).await.unwrap().id
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

// ---------------------------------------------------------------------------
// Pending scan
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn list_pending_is_oldest_first_and_skips_others(pool: PgPool) {
    let a = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();
    let b = CommandJobRepo::create(&pool, "TEST", "b", None).await.unwrap();
    let c = CommandJobRepo::create(&pool, "TEST", "c", None).await.unwrap();

    CommandJobRepo::cancel_pending(&pool, b.id, Utc::now())
        .await
        .unwrap();

    let pending = CommandJobRepo::list_pending(&pool, 10).await.unwrap();
    let ids: Vec<i64> = pending.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);

    let limited = CommandJobRepo::list_pending(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, a.id);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn claim_succeeds_once(pool: PgPool) {
    let job = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();

    assert!(CommandJobRepo::claim(&pool, job.id, Utc::now()).await.unwrap());
    assert!(!CommandJobRepo::claim(&pool, job.id, Utc::now()).await.unwrap());

    let stored = CommandJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::InProgress));
    assert!(stored.claimed_at.is_some());
    assert!(stored.executed_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn finish_claimed_sets_result_and_executed_at_together(pool: PgPool) {
    let job = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();

    let early = CommandJobRepo::finish_claimed(
        &pool,
        job.id,
        CommandStatus::Completed,
        Utc::now(),
        Some("done"),
    )
    .await
    .unwrap();
    assert!(!early, "finish must require a prior claim");

    CommandJobRepo::claim(&pool, job.id, Utc::now()).await.unwrap();
    let finished = CommandJobRepo::finish_claimed(
        &pool,
        job.id,
        CommandStatus::Failed,
        Utc::now(),
        Some("member not found"),
    )
    .await
    .unwrap();
    assert!(finished);

    let stored = CommandJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::Failed));
    assert_eq!(stored.result.as_deref(), Some("member not found"));
    assert!(stored.executed_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn cancel_only_applies_to_pending(pool: PgPool) {
    let pending = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();
    let claimed = CommandJobRepo::create(&pool, "TEST", "b", None).await.unwrap();
    CommandJobRepo::claim(&pool, claimed.id, Utc::now()).await.unwrap();

    assert!(CommandJobRepo::cancel_pending(&pool, pending.id, Utc::now())
        .await
        .unwrap());
    assert!(!CommandJobRepo::cancel_pending(&pool, claimed.id, Utc::now())
        .await
        .unwrap());
    assert!(!CommandJobRepo::cancel_pending(&pool, pending.id, Utc::now())
        .await
        .unwrap());

    let stored = CommandJobRepo::find_by_id(&pool, pending.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::Cancelled));
    assert!(stored.executed_at.is_some());
    assert!(stored.result.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn finish_claimed_refuses_non_outcome_status(pool: PgPool) {
    let job = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();
    CommandJobRepo::claim(&pool, job.id, Utc::now()).await.unwrap();

    let reverted =
        CommandJobRepo::finish_claimed(&pool, job.id, CommandStatus::Pending, Utc::now(), None)
            .await
            .unwrap();
    assert!(!reverted);

    let stored = CommandJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::InProgress));
}

#[sqlx::test(migrations = "./migrations")]
async fn stale_claims_are_failed(pool: PgPool) {
    let now = Utc::now();
    let stale = CommandJobRepo::create(&pool, "TEST", "stale", None).await.unwrap();
    let fresh = CommandJobRepo::create(&pool, "TEST", "fresh", None).await.unwrap();
    let waiting = CommandJobRepo::create(&pool, "TEST", "waiting", None).await.unwrap();
    CommandJobRepo::claim(&pool, stale.id, now - Duration::hours(1))
        .await
        .unwrap();
    CommandJobRepo::claim(&pool, fresh.id, now).await.unwrap();

    let failed =
        CommandJobRepo::fail_stale_claims(&pool, now - Duration::minutes(10), now, "claim expired")
            .await
            .unwrap();
    assert_eq!(failed, vec![stale.id]);

    let stored = CommandJobRepo::find_by_id(&pool, stale.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::Failed));
    assert_eq!(stored.result.as_deref(), Some("claim expired"));
    assert!(stored.executed_at.is_some());

    let stored = CommandJobRepo::find_by_id(&pool, fresh.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::InProgress));
    let stored = CommandJobRepo::find_by_id(&pool, waiting.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::Pending));
}

#[sqlx::test(migrations = "./migrations")]
async fn update_is_unconditional(pool: PgPool) {
    let job = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();
    CommandJobRepo::cancel_pending(&pool, job.id, Utc::now())
        .await
        .unwrap();

    let written = CommandJobRepo::update(
        &pool,
        job.id,
        CommandStatus::Completed,
        Utc::now(),
        Some("late result"),
    )
    .await
    .unwrap();
    assert!(written);

    let stored = CommandJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(CommandStatus::Completed));
    assert_eq!(stored.result.as_deref(), Some("late result"));

    let missing =
        CommandJobRepo::update(&pool, 987654, CommandStatus::Failed, Utc::now(), None)
            .await
            .unwrap();
    assert!(!missing);
}

// ---------------------------------------------------------------------------
// Listing and retention
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let a = CommandJobRepo::create(&pool, "TEST", "a", None).await.unwrap();
    let b = CommandJobRepo::create(&pool, "TEST", "b", None).await.unwrap();
    CommandJobRepo::cancel_pending(&pool, a.id, Utc::now())
        .await
        .unwrap();

    let all = CommandJobRepo::list(&pool, &CommandJobFilter::default())
        .await
        .unwrap();
    let ids: Vec<i64> = all.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);

    let pending = CommandJobRepo::list(
        &pool,
        &CommandJobFilter {
            status: Some(CommandStatus::Pending),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, b.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn retention_deletes_only_old_terminal_rows(pool: PgPool) {
    let now = Utc::now();
    let old = CommandJobRepo::create(&pool, "TEST", "old", None).await.unwrap();
    let fresh = CommandJobRepo::create(&pool, "TEST", "fresh", None).await.unwrap();
    let waiting = CommandJobRepo::create(&pool, "TEST", "waiting", None).await.unwrap();

    CommandJobRepo::update(
        &pool,
        old.id,
        CommandStatus::Completed,
        now - Duration::days(30),
        Some("ok"),
    )
    .await
    .unwrap();
    CommandJobRepo::update(&pool, fresh.id, CommandStatus::Failed, now, Some("err"))
        .await
        .unwrap();

    let deleted = CommandJobRepo::delete_terminal_before(&pool, now - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    assert!(CommandJobRepo::find_by_id(&pool, old.id).await.unwrap().is_none());
    assert!(CommandJobRepo::find_by_id(&pool, fresh.id).await.unwrap().is_some());
    assert!(CommandJobRepo::find_by_id(&pool, waiting.id).await.unwrap().is_some());
}
