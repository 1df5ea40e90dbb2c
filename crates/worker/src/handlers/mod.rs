//! Built-in command handlers.

pub mod diagnostic;
pub mod echo;
