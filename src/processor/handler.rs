//! Handler trait for processed events.

use async_trait::async_trait;

use crate::relay::HandlerError;
use crate::webhooks::RelayEvent;

/// Handles one kind of event against processor-owned state `S`.
///
/// Handlers run one at a time, so `state` is never shared with another
/// handler while this one is in flight.
#[async_trait]
pub trait EventHandler<S: Send>: Send + Sync {
    async fn handle(&self, state: &mut S, event: RelayEvent) -> Result<(), HandlerError>;
}
