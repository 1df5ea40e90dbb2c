//! Command job entity and query DTOs.

use courier_core::commands::CommandKind;
use courier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{CommandStatus, StatusId};

/// A row from the `command_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommandJob {
    pub id: DbId,
    pub command_type: String,
    pub target_id: String,
    pub parameters: Option<serde_json::Value>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub executed_at: Option<Timestamp>,
    /// Success payload or error message, depending on `status_id`.
    pub result: Option<String>,
    /// Reserved.
    pub retry_count: i32,
    /// Reserved.
    pub last_error: Option<String>,
}

impl CommandJob {
    /// Typed status. `None` only if the lookup table gained a row this
    /// build does not know about.
    pub fn status(&self) -> Option<CommandStatus> {
        CommandStatus::from_id(self.status_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_some_and(CommandStatus::is_terminal)
    }

    pub fn kind(&self) -> CommandKind {
        CommandKind::from_tag(&self.command_type)
    }
}

/// Query parameters for listing command jobs.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommandJobListQuery {
    /// Filter by status name (e.g. `pending`, `failed`).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

impl CommandJobListQuery {
    /// Resolve the raw query into a typed filter.
    pub fn to_filter(&self) -> Result<CommandJobFilter, String> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<CommandStatus>)
            .transpose()?;
        Ok(CommandJobFilter {
            status,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
pub const DEFAULT_LIMIT: i64 = 50;

/// Typed listing filter accepted by every job store.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandJobFilter {
    pub status: Option<CommandStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CommandJobFilter {
    /// Page size after applying the default and the cap.
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_applies_default_and_cap() {
        let filter = CommandJobFilter::default();
        assert_eq!(filter.effective_limit(), DEFAULT_LIMIT);
        assert_eq!(filter.effective_offset(), 0);

        let filter = CommandJobFilter {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), MAX_LIMIT);
        assert_eq!(filter.effective_offset(), 0);
    }

    #[test]
    fn list_query_parses_status_name() {
        let query = CommandJobListQuery {
            status: Some("failed".into()),
            limit: Some(5),
            offset: None,
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.status, Some(CommandStatus::Failed));
        assert_eq!(filter.limit, Some(5));

        let bad = CommandJobListQuery {
            status: Some("exploded".into()),
            ..Default::default()
        };
        assert!(bad.to_filter().is_err());
    }
}
