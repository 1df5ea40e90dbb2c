//! Command kinds understood by the dispatch queue.
//!
//! The `command_type` column is an open set of tag strings. Well-known tags
//! map to dedicated variants; anything else round-trips through
//! [`CommandKind::Custom`] so producers and workers can agree on new kinds
//! without a release of this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Maximum length of a command type tag.
pub const MAX_COMMAND_TYPE_LEN: usize = 64;

/// Maximum length of a target identifier.
pub const MAX_TARGET_ID_LEN: usize = 256;

/// A command the control process can hand off to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Remove a member from the remote platform.
    KickUser,
    /// Ban a member from the remote platform.
    BanUser,
    /// Temporarily mute a member.
    TimeoutUser,
    /// Close a support ticket.
    CloseTicket,
    /// Report worker and connection health.
    Diagnostic,
    /// Echo the parameters back; used for smoke tests.
    Test,
    /// Any other tag registered by the deployment.
    Custom(String),
}

impl CommandKind {
    /// Every well-known kind, in declaration order.
    pub const BUILTIN: [CommandKind; 6] = [
        CommandKind::KickUser,
        CommandKind::BanUser,
        CommandKind::TimeoutUser,
        CommandKind::CloseTicket,
        CommandKind::Diagnostic,
        CommandKind::Test,
    ];

    /// The tag persisted in `command_jobs.command_type`.
    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::KickUser => "KICK_USER",
            CommandKind::BanUser => "BAN_USER",
            CommandKind::TimeoutUser => "TIMEOUT_USER",
            CommandKind::CloseTicket => "CLOSE_TICKET",
            CommandKind::Diagnostic => "DIAGNOSTIC",
            CommandKind::Test => "TEST",
            CommandKind::Custom(tag) => tag,
        }
    }

    /// Resolve a stored tag. Unknown tags become [`CommandKind::Custom`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "KICK_USER" => CommandKind::KickUser,
            "BAN_USER" => CommandKind::BanUser,
            "TIMEOUT_USER" => CommandKind::TimeoutUser,
            "CLOSE_TICKET" => CommandKind::CloseTicket,
            "DIAGNOSTIC" => CommandKind::Diagnostic,
            "TEST" => CommandKind::Test,
            other => CommandKind::Custom(other.to_string()),
        }
    }

    /// Whether this is one of the [`BUILTIN`](Self::BUILTIN) kinds.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, CommandKind::Custom(_))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = CoreError;

    /// Parse a tag supplied by a producer.
    ///
    /// Rejects empty or whitespace-only tags and tags longer than
    /// [`MAX_COMMAND_TYPE_LEN`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_command_type(s)?;
        Ok(CommandKind::from_tag(s))
    }
}

impl Serialize for CommandKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CommandKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Validate a command type tag.
pub fn validate_command_type(tag: &str) -> Result<(), CoreError> {
    if tag.trim().is_empty() {
        return Err(CoreError::Validation(
            "Command type must not be empty".to_string(),
        ));
    }
    if tag.len() > MAX_COMMAND_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "Command type must not exceed {MAX_COMMAND_TYPE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a target identifier.
pub fn validate_target_id(target_id: &str) -> Result<(), CoreError> {
    if target_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Target id must not be empty".to_string(),
        ));
    }
    if target_id.len() > MAX_TARGET_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Target id must not exceed {MAX_TARGET_ID_LEN} characters"
        )));
    }
    Ok(())
}
