//! Status helper enum mapping to the `command_statuses` lookup table.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! migration, and the ids in [`courier_core::lifecycle::status_ids`].

use courier_core::lifecycle::{state_machine, status_ids};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Command job execution status.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Pending = status_ids::PENDING,
    InProgress = status_ids::IN_PROGRESS,
    Completed = status_ids::COMPLETED,
    Failed = status_ids::FAILED,
    Cancelled = status_ids::CANCELLED,
}

impl CommandStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            status_ids::PENDING => Some(CommandStatus::Pending),
            status_ids::IN_PROGRESS => Some(CommandStatus::InProgress),
            status_ids::COMPLETED => Some(CommandStatus::Completed),
            status_ids::FAILED => Some(CommandStatus::Failed),
            status_ids::CANCELLED => Some(CommandStatus::Cancelled),
            _ => None,
        }
    }

    /// Lower-case name matching `command_statuses.name`.
    pub fn name(self) -> &'static str {
        state_machine::status_name(self.id())
    }

    pub fn is_terminal(self) -> bool {
        state_machine::is_terminal(self.id())
    }

    /// Whether the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: CommandStatus) -> bool {
        state_machine::can_transition(self.id(), to.id())
    }
}

impl From<CommandStatus> for StatusId {
    fn from(value: CommandStatus) -> Self {
        value as StatusId
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CommandStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        state_machine::status_id(s)
            .and_then(CommandStatus::from_id)
            .ok_or_else(|| format!("unknown command status '{s}'"))
    }
}
