//! Errors raised while handling an event.

use thiserror::Error;

use crate::chat::ChatError;
use crate::ci::CiError;
use crate::status::InvalidJobState;
use crate::types::ValidationError;
use crate::webhooks::EventKind;

/// Why an event could not be relayed. Logged by the processor, never fatal.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    InvalidJobState(#[from] InvalidJobState),

    /// The chat service returned a locator the cache would not accept.
    #[error("posted message has an invalid locator: {0}")]
    Validation(#[from] ValidationError),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("CI error: {0}")]
    Ci(#[from] CiError),

    /// A handler was registered for a kind it does not handle.
    #[error("handler cannot process {0} events")]
    UnexpectedEvent(EventKind),
}
