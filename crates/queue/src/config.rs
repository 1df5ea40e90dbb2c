//! Queue and retention configuration loaded from environment variables.

use std::time::Duration;

use courier_core::env::parse_or;
use courier_core::error::CoreError;
use courier_core::lifecycle::ClaimMode;

/// Default dispatcher tick interval.
pub const DEFAULT_DISPATCH_INTERVAL_MS: u64 = 2000;

/// Default interval between result waiter re-reads.
pub const DEFAULT_WAIT_POLL_INTERVAL_MS: u64 = 1000;

/// Default bound for a result wait when the caller does not pass one.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Upper bound on any caller-supplied wait. Kept below the HTTP request
/// timeout so the middleware never cuts a wait short.
pub const MAX_WAIT_TIMEOUT_MS: u64 = 25_000;

/// Default maximum number of pending jobs picked up per tick.
pub const DEFAULT_DISPATCH_BATCH_SIZE: i64 = 100;

/// Default grace period for in-flight handlers on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Default age after which an unfinished claim is failed: 10 minutes.
pub const DEFAULT_STALE_CLAIM_TIMEOUT_SECS: u64 = 600;

/// Stored as the result of a claim failed by recovery.
pub const STALE_CLAIM_MESSAGE: &str = "claim expired before the worker recorded an outcome";

/// Default retention period for terminal jobs: 7 days.
pub const DEFAULT_RETENTION_HOURS: i64 = 168;

/// Default retention sweep interval: 1 hour.
pub const DEFAULT_RETENTION_INTERVAL_SECS: u64 = 3600;

/// Settings shared by the producer and dispatcher sides.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How often the dispatcher scans for pending jobs.
    pub dispatch_interval: Duration,
    /// Maximum number of pending jobs dispatched per tick.
    pub dispatch_batch_size: i64,
    /// How often a result waiter re-reads its job.
    pub wait_poll_interval: Duration,
    /// Wait bound used when a caller does not supply one.
    pub default_wait_timeout: Duration,
    /// Whether the dispatcher claims jobs before running them.
    pub claim_mode: ClaimMode,
    /// How long the dispatcher waits for in-flight handlers on shutdown.
    pub shutdown_grace: Duration,
    /// Claims older than this with no recorded outcome are failed by the
    /// dispatcher. `None` disables recovery.
    pub stale_claim_timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_millis(DEFAULT_DISPATCH_INTERVAL_MS),
            dispatch_batch_size: DEFAULT_DISPATCH_BATCH_SIZE,
            wait_poll_interval: Duration::from_millis(DEFAULT_WAIT_POLL_INTERVAL_MS),
            default_wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            claim_mode: ClaimMode::default(),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            stale_claim_timeout: Some(Duration::from_secs(DEFAULT_STALE_CLAIM_TIMEOUT_SECS)),
        }
    }
}

impl QueueConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `DISPATCH_INTERVAL_MS`     | `2000`     |
    /// | `DISPATCH_BATCH_SIZE`      | `100`      |
    /// | `WAIT_POLL_INTERVAL_MS`    | `1000`     |
    /// | `DEFAULT_WAIT_TIMEOUT_MS`  | `10000`    |
    /// | `CLAIM_MODE`               | `enforced` |
    /// | `SHUTDOWN_GRACE_SECS`      | `10`       |
    /// | `STALE_CLAIM_TIMEOUT_SECS` | `600`      |
    ///
    /// `STALE_CLAIM_TIMEOUT_SECS=0` turns stale-claim recovery off.
    pub fn from_env() -> Result<Self, CoreError> {
        let stale_claim_secs: u64 =
            parse_or("STALE_CLAIM_TIMEOUT_SECS", DEFAULT_STALE_CLAIM_TIMEOUT_SECS)?;
        let config = Self {
            dispatch_interval: Duration::from_millis(parse_or(
                "DISPATCH_INTERVAL_MS",
                DEFAULT_DISPATCH_INTERVAL_MS,
            )?),
            dispatch_batch_size: parse_or("DISPATCH_BATCH_SIZE", DEFAULT_DISPATCH_BATCH_SIZE)?,
            wait_poll_interval: Duration::from_millis(parse_or(
                "WAIT_POLL_INTERVAL_MS",
                DEFAULT_WAIT_POLL_INTERVAL_MS,
            )?),
            default_wait_timeout: Duration::from_millis(parse_or(
                "DEFAULT_WAIT_TIMEOUT_MS",
                DEFAULT_WAIT_TIMEOUT_MS,
            )?),
            claim_mode: parse_or("CLAIM_MODE", ClaimMode::default())?,
            shutdown_grace: Duration::from_secs(parse_or(
                "SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            )?),
            stale_claim_timeout: (stale_claim_secs > 0)
                .then(|| Duration::from_secs(stale_claim_secs)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a loop spin or contradict each other.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.dispatch_interval.is_zero() {
            return Err(CoreError::Validation(
                "DISPATCH_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        if self.wait_poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "WAIT_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        if self.dispatch_batch_size < 1 {
            return Err(CoreError::Validation(
                "DISPATCH_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.default_wait_timeout > Duration::from_millis(MAX_WAIT_TIMEOUT_MS) {
            return Err(CoreError::Validation(format!(
                "DEFAULT_WAIT_TIMEOUT_MS must not exceed {MAX_WAIT_TIMEOUT_MS}"
            )));
        }
        // A claim still draining on shutdown must not be failed underneath it.
        if let Some(stale) = self.stale_claim_timeout {
            if stale <= self.shutdown_grace {
                return Err(CoreError::Validation(
                    "STALE_CLAIM_TIMEOUT_SECS must exceed SHUTDOWN_GRACE_SECS".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Settings for the terminal-job retention sweep.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Terminal jobs executed longer ago than this are deleted.
    pub retention: chrono::Duration,
    /// How often the sweep runs.
    pub interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::hours(DEFAULT_RETENTION_HOURS),
            interval: Duration::from_secs(DEFAULT_RETENTION_INTERVAL_SECS),
        }
    }
}

impl RetentionConfig {
    /// Load from `RETENTION_HOURS` (default 168) and
    /// `RETENTION_INTERVAL_SECS` (default 3600).
    pub fn from_env() -> Result<Self, CoreError> {
        let hours: i64 = parse_or("RETENTION_HOURS", DEFAULT_RETENTION_HOURS)?;
        if hours < 1 {
            return Err(CoreError::Validation(
                "RETENTION_HOURS must be at least 1".to_string(),
            ));
        }
        let interval_secs: u64 =
            parse_or("RETENTION_INTERVAL_SECS", DEFAULT_RETENTION_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(CoreError::Validation(
                "RETENTION_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            retention: chrono::Duration::hours(hours),
            interval: Duration::from_secs(interval_secs),
        })
    }
}
