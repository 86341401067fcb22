//! GitHub webhook intake.
//!
//! - [`signature`]: HMAC-SHA256 delivery authentication
//! - [`parser`]: payload parsing into [`RelayEvent`]s
//! - [`events`]: the event types handlers receive

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{EventKind, JobAction, JobEvent, RelayEvent, RunCompletedEvent};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
