//! The processor task and its handles.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::webhooks::{EventKind, RelayEvent};

use super::handler::EventHandler;
use super::{ProcessorClosed, ShutdownError};

type Handlers<S> = HashMap<EventKind, Box<dyn EventHandler<S>>>;

/// Admission state shared by producers and the task. Kept in one watch value
/// so the closed check and the counter increment happen under one lock.
#[derive(Debug, Default)]
struct Intake {
    /// Events enqueued but not yet fully handled.
    outstanding: usize,
    /// Set once shutdown begins; no new events are accepted after.
    closed: bool,
}

/// Collects handlers before processing starts.
pub struct ProcessorBuilder<S> {
    state: S,
    handlers: Handlers<S>,
}

impl<S: Send + 'static> ProcessorBuilder<S> {
    pub fn new(state: S) -> Self {
        ProcessorBuilder {
            state,
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `kind`, replacing any earlier registration.
    pub fn register(mut self, kind: EventKind, handler: impl EventHandler<S> + 'static) -> Self {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            debug!(kind = %kind, "Replaced event handler");
        }
        self
    }

    /// Spawns the processing task. Must be called within a tokio runtime.
    pub fn start(self) -> EventProcessor<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (intake, _) = watch::channel(Intake::default());
        let intake = Arc::new(intake);
        let cancel = CancellationToken::new();

        let worker = Worker {
            state: self.state,
            handlers: self.handlers,
            intake: Arc::clone(&intake),
        };
        let task = tokio::spawn(worker.run(rx, cancel.clone()));

        EventProcessor {
            queue: EventQueue { tx, intake },
            cancel,
            task,
        }
    }
}

/// A cloneable handle for submitting events.
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<RelayEvent>,
    intake: Arc<watch::Sender<Intake>>,
}

impl EventQueue {
    /// Submits an event without waiting for it to be handled.
    pub fn enqueue(&self, event: RelayEvent) -> Result<(), ProcessorClosed> {
        let admitted = self.intake.send_if_modified(|intake| {
            if intake.closed {
                return false;
            }
            intake.outstanding += 1;
            true
        });
        if !admitted {
            return Err(ProcessorClosed);
        }
        if self.tx.send(event).is_err() {
            self.intake.send_modify(|intake| intake.outstanding -= 1);
            return Err(ProcessorClosed);
        }
        Ok(())
    }

    /// Resolves once every enqueued event has been handled.
    ///
    /// Events enqueued while waiting are waited for too.
    pub async fn drain(&self) {
        let mut rx = self.intake.subscribe();
        // Only fails if the sender is dropped, and `self` holds it.
        let _ = rx.wait_for(|intake| intake.outstanding == 0).await;
    }

    /// Number of events enqueued but not yet handled.
    pub fn pending(&self) -> usize {
        self.intake.borrow().outstanding
    }

    pub fn is_closed(&self) -> bool {
        self.intake.borrow().closed || self.tx.is_closed()
    }

    fn close(&self) {
        self.intake.send_modify(|intake| intake.closed = true);
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A running processor. Owns the task; hand out [`EventQueue`]s to producers.
pub struct EventProcessor<S> {
    queue: EventQueue,
    cancel: CancellationToken,
    task: JoinHandle<S>,
}

impl<S> EventProcessor<S> {
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    pub fn enqueue(&self, event: RelayEvent) -> Result<(), ProcessorClosed> {
        self.queue.enqueue(event)
    }

    pub async fn drain(&self) {
        self.queue.drain().await
    }

    /// Stops accepting events, waits up to `timeout` for queued events to be
    /// handled, then stops the task and returns its state.
    ///
    /// On timeout the task is aborted and anything still queued is dropped.
    pub async fn shutdown(self, timeout: Duration) -> Result<S, ShutdownError> {
        self.queue.close();
        let drained = tokio::time::timeout(timeout, self.queue.drain()).await.is_ok();
        self.cancel.cancel();

        if !drained {
            let pending = self.queue.pending();
            warn!(pending, ?timeout, "Drain timed out, dropping remaining events");
            self.task.abort();
            return Err(ShutdownError::DrainTimeout { pending });
        }

        let state = self.task.await?;
        info!("Event processor stopped");
        Ok(state)
    }
}

struct Worker<S> {
    state: S,
    handlers: Handlers<S>,
    intake: Arc<watch::Sender<Intake>>,
}

impl<S: Send + 'static> Worker<S> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RelayEvent>, cancel: CancellationToken) -> S {
        info!(handlers = self.handlers.len(), "Event processor started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Shutdown signal received, stopping event processor");
                    break;
                }

                event = rx.recv() => {
                    let Some(event) = event else {
                        info!("Event channel closed");
                        break;
                    };
                    self.dispatch(event).await;
                    self.intake
                        .send_modify(|intake| intake.outstanding = intake.outstanding.saturating_sub(1));
                }
            }
        }

        self.state
    }

    #[instrument(skip_all, fields(kind = %event.kind(), run = %event.run_key()))]
    async fn dispatch(&mut self, event: RelayEvent) {
        let Some(handler) = self.handlers.get(&event.kind()) else {
            debug!("No handler registered, dropping event");
            return;
        };
        // A panicking handler must not take the task down with it.
        let outcome = AssertUnwindSafe(handler.handle(&mut self.state, event))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => trace!("Event handled"),
            Ok(Err(e)) => error!(error = %e, "Event handler failed"),
            Err(panic) => error!(panic = panic_message(&*panic), "Event handler panicked"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
