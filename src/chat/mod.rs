//! Chat collaborator: where status messages are posted and updated.
//!
//! The relay never keeps message content locally. The posted message is the
//! source of truth for its blocks; each update is a read-modify-write against
//! it. Only the message's locator is cached.
//!
//! The [`ChatApi`] trait is the seam between the relay and the chat service.
//! [`SlackClient`] implements it against the Slack Web API; tests use an
//! in-memory implementation.

mod error;
mod slack;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::status::Block;
use crate::types::{MessageLocator, PostedMessage};

pub use error::ChatError;
pub use slack::SlackClient;

/// The content of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    /// Plain-text fallback shown in notifications.
    pub text: String,

    /// Sidebar color (`#rrggbb`). When set, blocks are rendered inside a
    /// colored attachment so the color can be changed later.
    pub color: Option<String>,

    pub blocks: Vec<Block>,
}

impl MessageContent {
    pub fn new(text: impl Into<String>, blocks: Vec<Block>) -> Self {
        MessageContent {
            text: text.into(),
            color: None,
            blocks,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Operations the relay needs from a chat service.
pub trait ChatApi {
    /// Posts a message, optionally as a reply in the thread of `thread_ts`.
    fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
        thread_ts: Option<&str>,
    ) -> impl Future<Output = Result<PostedMessage, ChatError>> + Send;

    /// Replaces the content of an existing message.
    fn update_message(
        &self,
        locator: &MessageLocator,
        content: &MessageContent,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Reads a message back. `Ok(None)` if it no longer exists.
    fn read_message(
        &self,
        locator: &MessageLocator,
    ) -> impl Future<Output = Result<Option<MessageContent>, ChatError>> + Send;
}
