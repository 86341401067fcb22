//! Serialized event processing.
//!
//! Every event passes through a single tokio task that owns the handler state
//! and awaits each handler to completion before taking the next event. This
//! gives FIFO ordering and at most one handler in flight, so the state (the
//! correlation cache in production) needs no lock.
//!
//! ```text
//! producers --enqueue--> [unbounded mpsc] --> task: handler(&mut state, event)
//!                 \                                          |
//!                  +--> outstanding += 1       outstanding -= 1
//! ```
//!
//! [`EventQueue::drain`] watches the outstanding counter; shutdown stops
//! accepting events, drains with a bound, then stops the task.
//!
//! # Module Structure
//!
//! - [`handler`]: the [`EventHandler`] trait
//! - `worker`: builder, handles and the processing loop

pub mod handler;
mod worker;


use thiserror::Error;

pub use handler::EventHandler;
pub use worker::{EventProcessor, EventQueue, ProcessorBuilder};

/// The processor no longer accepts events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event processor is shut down")]
pub struct ProcessorClosed;

/// Errors from [`EventProcessor::shutdown`].
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Queued events were still outstanding when the drain bound elapsed.
    #[error("drain timed out with {pending} events outstanding")]
    DrainTimeout { pending: usize },

    /// The processing task panicked.
    #[error("event processor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
