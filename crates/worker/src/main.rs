use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_core::commands::CommandKind;
use courier_core::env::parse_or;
use courier_queue::{retention, Dispatcher, QueueContext};
use courier_worker::builtin_registry;
use courier_worker::config::WorkerConfig;

#[tokio::main]
async fn main() {
    let started_at = Instant::now();
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing("courier_worker=debug,courier_queue=debug");

    // --- Configuration ---
    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    tracing::info!(
        dispatch_interval_ms = config.queue.dispatch_interval.as_millis() as u64,
        claim_mode = %config.queue.claim_mode,
        retention_hours = config.retention.retention.num_hours(),
        stale_claim_timeout_secs = config.queue.stale_claim_timeout.map(|t| t.as_secs()),
        "Loaded worker configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections = parse_or("DB_MAX_CONNECTIONS", courier_db::DEFAULT_MAX_CONNECTIONS)
        .expect("Invalid DB_MAX_CONNECTIONS");

    let pool = courier_db::create_pool(&database_url, max_connections)
        .await
        .expect("Failed to connect to database");
    courier_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    courier_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Handlers ---
    let registry = builtin_registry(started_at);
    let missing = registry.missing_builtin_kinds();
    if config.require_all_handlers {
        registry
            .validate(&CommandKind::BUILTIN)
            .expect("Handler registry is incomplete");
    } else if !missing.is_empty() {
        let missing: Vec<&str> = missing.iter().map(CommandKind::as_str).collect();
        tracing::warn!(
            missing = ?missing,
            "No handler registered for some command types; their jobs will fail",
        );
    }

    // --- Background loops ---
    let queue = QueueContext::postgres(pool.clone(), config.queue.clone());
    let cancel = CancellationToken::new();

    let dispatcher = Dispatcher::new(queue.clone(), Arc::new(registry));
    let dispatcher_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run(cancel).await }
    });

    let retention_handle = tokio::spawn(retention::run(
        Arc::clone(queue.store()),
        config.retention.clone(),
        cancel.clone(),
    ));

    tracing::info!("Worker started");
    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    // The dispatcher applies its own grace period to in-flight handlers.
    let wait = config.queue.shutdown_grace + Duration::from_secs(5);
    match tokio::time::timeout(wait, dispatcher_handle).await {
        Err(_) => tracing::warn!("Dispatcher did not stop in time"),
        Ok(Err(e)) => tracing::error!(error = %e, "Dispatcher task failed"),
        Ok(Ok(())) => {}
    }
    match tokio::time::timeout(Duration::from_secs(5), retention_handle).await {
        Err(_) => tracing::warn!("Retention sweep did not stop in time"),
        Ok(Err(e)) => tracing::error!(error = %e, "Retention task failed"),
        Ok(Ok(())) => {}
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`;
/// `LOG_FORMAT=json` switches to structured JSON lines.
fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for SIGINT or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping worker"),
        () = terminate => tracing::info!("Received SIGTERM, stopping worker"),
    }
}
