//! Polling command-dispatch queue.
//!
//! The control process uses [`Enqueuer`], [`ResultWaiter`] and [`Canceller`];
//! the worker process builds a [`HandlerRegistry`] and runs a [`Dispatcher`].
//! Both sides talk only to the shared [`JobStore`](courier_db::store::JobStore)
//! held by a [`QueueContext`].

pub mod cancel;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod enqueue;
pub mod error;
pub mod handler;
pub mod registry;
pub mod retention;
pub mod waiter;

pub use cancel::{CancelOutcome, Canceller};
pub use config::{QueueConfig, RetentionConfig};
pub use context::QueueContext;
pub use dispatcher::Dispatcher;
pub use enqueue::Enqueuer;
pub use error::QueueError;
pub use handler::{handler_fn, CommandHandler, HandlerError};
pub use registry::HandlerRegistry;
pub use waiter::{CommandOutcome, FailureKind, ResultWaiter};
