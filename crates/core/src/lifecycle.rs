//! Command job lifecycle: status ids, state machine, and claim policy.
//!
//! Every conditional write in the repository and the in-memory store checks
//! [`state_machine::can_transition`] before touching a row, so the table below
//! is the single source of legal edges.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status ids
// ---------------------------------------------------------------------------

/// Status ids matching `command_statuses` seed data (1-based SMALLSERIAL).
pub mod status_ids {
    pub const PENDING: i16 = 1;
    pub const IN_PROGRESS: i16 = 2;
    pub const COMPLETED: i16 = 3;
    pub const FAILED: i16 = 4;
    pub const CANCELLED: i16 = 5;

    /// Statuses with no outgoing transitions.
    pub const TERMINAL: [i16; 3] = [COMPLETED, FAILED, CANCELLED];
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::status_ids::*;

    /// Returns the set of valid target status ids reachable from `from_status`.
    ///
    /// Terminal states return an empty slice.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            // Pending -> InProgress (claim), Completed, Failed, Cancelled
            PENDING => &[IN_PROGRESS, COMPLETED, FAILED, CANCELLED],
            // InProgress -> Completed, Failed (including a stale claim failed
            // by recovery)
            IN_PROGRESS => &[COMPLETED, FAILED],
            COMPLETED | FAILED | CANCELLED => &[],
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: i16, to: i16) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Whether `status` is terminal.
    pub fn is_terminal(status: i16) -> bool {
        TERMINAL.contains(&status)
    }

    /// Lower-case status name as exposed over the API.
    pub fn status_name(id: i16) -> &'static str {
        match id {
            PENDING => "pending",
            IN_PROGRESS => "in_progress",
            COMPLETED => "completed",
            FAILED => "failed",
            CANCELLED => "cancelled",
            _ => "unknown",
        }
    }

    /// Inverse of [`status_name`].
    pub fn status_id(name: &str) -> Option<i16> {
        match name {
            "pending" => Some(PENDING),
            "in_progress" => Some(IN_PROGRESS),
            "completed" => Some(COMPLETED),
            "failed" => Some(FAILED),
            "cancelled" => Some(CANCELLED),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Claim policy
// ---------------------------------------------------------------------------

/// How the dispatcher guards against executing the same job twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimMode {
    /// Conditionally move `pending -> in_progress` before running a handler
    /// and only record the outcome if the job is still `in_progress`.
    /// Guarantees at-most-once execution.
    #[default]
    Enforced,
    /// No claim step and unconditional outcome writes. Overlapping ticks may
    /// run a job more than once and a racing cancel can be overwritten.
    BestEffort,
}

impl ClaimMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimMode::Enforced => "enforced",
            ClaimMode::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for ClaimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforced" => Ok(ClaimMode::Enforced),
            "best_effort" | "best-effort" => Ok(ClaimMode::BestEffort),
            other => Err(CoreError::Validation(format!(
                "Unknown claim mode '{other}' (expected 'enforced' or 'best_effort')"
            ))),
        }
    }
}
