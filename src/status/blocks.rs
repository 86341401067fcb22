//! Slack Block Kit representation of a status message.
//!
//! Only job-container blocks are understood; every other block is kept as raw
//! JSON and passed through untouched. A job container is a `context` block
//! whose `block_id` starts with [`JOB_BLOCK_ID_PREFIX`]. Each of its elements
//! is one job line.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::job::JobState;

/// Maximum elements Slack renders in a single context block.
pub const JOB_BLOCK_LIMIT: usize = 10;

/// Prefix marking a context block as a job container.
pub const JOB_BLOCK_ID_PREFIX: &str = "jobs-";

/// One block of a status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Block {
    /// A container of job lines, managed by the merge engine.
    Jobs(JobsBlock),
    /// Any other block. Opaque to the merge engine.
    Other(Value),
}

impl Block {
    pub fn as_jobs(&self) -> Option<&JobsBlock> {
        match self {
            Block::Jobs(b) => Some(b),
            Block::Other(_) => None,
        }
    }

    pub fn is_jobs(&self) -> bool {
        matches!(self, Block::Jobs(_))
    }
}

impl From<Value> for Block {
    fn from(value: Value) -> Self {
        match JobsBlock::from_value(&value) {
            Some(jobs) => Block::Jobs(jobs),
            None => Block::Other(value),
        }
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        match block {
            Block::Jobs(jobs) => jobs.to_value(),
            Block::Other(value) => value,
        }
    }
}

/// A context block holding up to [`JOB_BLOCK_LIMIT`] job lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsBlock {
    pub block_id: String,
    pub elements: Vec<JobElement>,
}

impl JobsBlock {
    /// Block id for the `index`-th job container.
    pub fn block_id_for(index: usize) -> String {
        format!("{JOB_BLOCK_ID_PREFIX}{index}")
    }

    /// Recognizes a job container in raw block JSON.
    ///
    /// Returns `None` if the block is not a job container, or if any element
    /// lacks a recoverable job URL (such a block is treated as opaque).
    fn from_value(value: &Value) -> Option<Self> {
        if value.get("type")?.as_str()? != "context" {
            return None;
        }
        let block_id = value.get("block_id")?.as_str()?;
        if !block_id.starts_with(JOB_BLOCK_ID_PREFIX) {
            return None;
        }
        let elements = value
            .get("elements")?
            .as_array()?
            .iter()
            .map(|el| el.get("text")?.as_str().and_then(JobElement::from_text))
            .collect::<Option<Vec<_>>>()?;
        Some(JobsBlock {
            block_id: block_id.to_string(),
            elements,
        })
    }

    fn to_value(&self) -> Value {
        let elements: Vec<Value> = self
            .elements
            .iter()
            .map(|el| json!({ "type": "mrkdwn", "text": el.text }))
            .collect();
        json!({
            "type": "context",
            "block_id": self.block_id,
            "elements": elements,
        })
    }
}

/// One rendered job line: `"{emoji} <{url}|{name}>"` plus an optional
/// `" ({m}:{ss})"` elapsed suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobElement {
    pub url: String,
    pub text: String,
}

impl JobElement {
    /// Parses a rendered line back into an element, recovering its URL.
    pub fn from_text(text: &str) -> Option<Self> {
        let start = text.find('<')? + 1;
        let rest = &text[start..];
        let end = rest.find(['|', '>'])?;
        let url = &rest[..end];
        if url.is_empty() {
            return None;
        }
        Some(JobElement {
            url: url.to_string(),
            text: text.to_string(),
        })
    }

    /// The state encoded by the line's leading emoji, if recognizable.
    pub fn state(&self) -> Option<JobState> {
        JobState::from_rendered(&self.text)
    }

    /// True if the line already shows a final outcome.
    pub fn is_terminal(&self) -> bool {
        self.state().is_some_and(JobState::is_terminal)
    }
}

/// Iterates every job line in block order.
pub fn job_elements(blocks: &[Block]) -> impl Iterator<Item = &JobElement> {
    blocks
        .iter()
        .filter_map(Block::as_jobs)
        .flat_map(|b| b.elements.iter())
}
