//! Workflow Relay - mirrors GitHub Actions runs into Slack.
//!
//! Each opted-in workflow run gets one status message that is updated in
//! place as its jobs progress, with threaded replies for failed jobs and a
//! summary when the run completes.
//!
//! # Module Structure
//!
//! - [`server`]: webhook and health endpoints
//! - [`webhooks`]: signature verification and payload parsing
//! - [`processor`]: serialized event processing
//! - [`relay`]: the handlers that maintain status messages
//! - [`cache`]: run to message correlation
//! - [`status`]: message layout and the job merge engine
//! - [`eligibility`]: per-workflow opt-in
//! - [`chat`], [`ci`]: external service clients

pub mod cache;
pub mod chat;
pub mod ci;
pub mod config;
pub mod eligibility;
pub mod processor;
pub mod relay;
pub mod server;
pub mod status;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
