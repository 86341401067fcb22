//! Event handlers that keep each run's status message current.
//!
//! A run is announced lazily: its first job event (of any kind) triggers the
//! eligibility check and, if the workflow opted in, the root message is
//! posted with that job already in it. Later job events are folded into the
//! message; the run-completion event recolors it and posts a summary.
//!
//! ```text
//! UNSEEN --job event, eligible--> ADMITTED --run completed--> CLOSED
//!   ^ |                               |
//!   | +--job event, not eligible      +--evicted from cache--> UNSEEN
//!   | |     |
//!   | |     v
//!   | |  REJECTED (later job events skip the check)
//!   +---------------------------------+
//! ```
//!
//! A rejection is remembered in a second LRU of the same capacity. A fetch
//! failure that might clear up is not remembered, so the next job event
//! checks again.
//!
//! Only the message locator is kept locally. The message itself is read back
//! before every update.

mod error;
mod job;
mod run;


use std::num::NonZeroUsize;

use crate::cache::{LocatorCache, LruCache};
use crate::chat::ChatApi;
use crate::ci::CiApi;
use crate::eligibility::DEFAULT_OPT_IN_FLAG;
use crate::processor::ProcessorBuilder;
use crate::types::RunKey;
use crate::webhooks::EventKind;

pub use error::HandlerError;
pub use job::JobHandler;
pub use run::RunCompletedHandler;

/// Everything the handlers share, owned by the processor task.
pub struct RelayState<C, G> {
    pub cache: LocatorCache,
    /// Runs whose workflow did not opt in.
    rejected: LruCache<RunKey, ()>,
    chat: C,
    ci: G,
    channel: String,
    opt_in_flag: String,
}

impl<C: ChatApi, G: CiApi> RelayState<C, G> {
    pub fn new(chat: C, ci: G, channel: impl Into<String>, cache_capacity: NonZeroUsize) -> Self {
        RelayState {
            cache: LocatorCache::new(cache_capacity),
            rejected: LruCache::new(cache_capacity),
            chat,
            ci,
            channel: channel.into(),
            opt_in_flag: DEFAULT_OPT_IN_FLAG.to_string(),
        }
    }

    /// Sets the workflow `env` flag that opts a run in.
    pub fn with_opt_in_flag(mut self, flag: impl Into<String>) -> Self {
        self.opt_in_flag = flag.into();
        self
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn ci(&self) -> &G {
        &self.ci
    }

    /// Channel new status messages are posted to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn opt_in_flag(&self) -> &str {
        &self.opt_in_flag
    }
}

/// A processor builder with the relay handlers registered for every kind.
pub fn processor_builder<C, G>(state: RelayState<C, G>) -> ProcessorBuilder<RelayState<C, G>>
where
    C: ChatApi + Send + Sync + 'static,
    G: CiApi + Send + Sync + 'static,
{
    ProcessorBuilder::new(state)
        .register(EventKind::JobQueued, JobHandler)
        .register(EventKind::JobInProgress, JobHandler)
        .register(EventKind::JobCompleted, JobHandler)
        .register(EventKind::RunCompleted, RunCompletedHandler)
}
