//! Domain types shared by every courier crate.
//!
//! Kept free of I/O and internal dependencies so that the control process,
//! the worker, and the storage layer can all depend on it.

pub mod commands;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod types;
