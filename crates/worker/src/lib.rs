//! Courier worker: the process that owns the platform connection and
//! executes queued commands.
//!
//! Platform handlers (`KICK_USER`, `BAN_USER`, ...) are supplied by the
//! embedding deployment; this crate only ships the built-ins that need
//! nothing beyond the process itself.

pub mod config;
pub mod handlers;

use std::time::Instant;

use courier_core::commands::CommandKind;
use courier_queue::HandlerRegistry;

/// Registry pre-populated with the built-in handlers.
pub fn builtin_registry(started_at: Instant) -> HandlerRegistry {
    HandlerRegistry::new()
        .with(
            CommandKind::Diagnostic,
            handlers::diagnostic::handler(started_at),
        )
        .with(CommandKind::Test, handlers::echo::handler())
}
