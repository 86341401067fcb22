//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of identifiers (a run id where an
//! attempt number is expected, an unchecked channel/timestamp pair where a
//! validated locator is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Identifies one execution attempt of a workflow run.
///
/// Re-running a workflow keeps the run id and bumps the attempt, so each
/// attempt gets its own status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub run_id: u64,
    pub run_attempt: u32,
}

impl RunKey {
    pub fn new(run_id: u64, run_attempt: u32) -> Self {
        RunKey {
            run_id,
            run_attempt,
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.run_id, self.run_attempt)
    }
}

/// A locator or message reference failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("channel must be a non-empty identifier without whitespace, got {0:?}")]
    InvalidChannel(String),

    #[error("message timestamp must look like `<seconds>.<micros>`, got {0:?}")]
    InvalidTimestamp(String),
}

/// The channel/timestamp pair returned by the chat API after posting.
///
/// Nothing about it has been checked yet; convert it into a
/// [`MessageLocator`] before storing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

impl PostedMessage {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        PostedMessage {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

/// The address of a posted root status message.
///
/// Only constructible through validation, so a `MessageLocator` in hand always
/// has a plausible channel and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PostedMessage", into = "PostedMessage")]
pub struct MessageLocator {
    channel: String,
    ts: String,
}

impl MessageLocator {
    /// Validates a channel and timestamp.
    pub fn parse(channel: &str, ts: &str) -> Result<Self, ValidationError> {
        if channel.is_empty() || channel.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidChannel(channel.to_string()));
        }
        if !is_message_timestamp(ts) {
            return Err(ValidationError::InvalidTimestamp(ts.to_string()));
        }
        Ok(MessageLocator {
            channel: channel.to_string(),
            ts: ts.to_string(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn ts(&self) -> &str {
        &self.ts
    }
}

impl fmt::Display for MessageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.channel, self.ts)
    }
}

impl TryFrom<PostedMessage> for MessageLocator {
    type Error = ValidationError;

    fn try_from(posted: PostedMessage) -> Result<Self, Self::Error> {
        MessageLocator::parse(&posted.channel, &posted.ts)
    }
}

impl From<MessageLocator> for PostedMessage {
    fn from(locator: MessageLocator) -> Self {
        PostedMessage {
            channel: locator.channel,
            ts: locator.ts,
        }
    }
}

/// Slack timestamps are `<digits>.<digits>`, e.g. `1712345678.123456`.
fn is_message_timestamp(ts: &str) -> bool {
    match ts.split_once('.') {
        Some((secs, frac)) => {
            !secs.is_empty()
                && !frac.is_empty()
                && secs.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
