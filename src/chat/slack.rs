//! Slack Web API client.
//!
//! Uses `chat.postMessage`, `chat.update` and `conversations.history`. Colored
//! messages carry their blocks inside a single attachment, which is the only
//! way Slack lets a message's sidebar color change after posting.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::status::Block;
use crate::types::{MessageLocator, PostedMessage};

use super::error::ChatError;
use super::{ChatApi, MessageContent};

/// Base URL of the Slack Web API.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// A Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    /// Creates a client against a different API root (e.g. a test double).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        SlackClient {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<T, ChatError> {
        trace!(method, "Slack API call");
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        unwrap_envelope(method, response)
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, ChatError> {
        trace!(method, "Slack API call");
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        unwrap_envelope(method, response)
    }
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatApi for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, ChatError> {
        let mut body = render_content(content);
        body.insert("channel".into(), json!(channel));
        if let Some(ts) = thread_ts {
            body.insert("thread_ts".into(), json!(ts));
        }
        let posted: PostedMessage = self.post_json("chat.postMessage", &Value::Object(body)).await?;
        debug!(channel = %posted.channel, ts = %posted.ts, "Posted message");
        Ok(posted)
    }

    async fn update_message(
        &self,
        locator: &MessageLocator,
        content: &MessageContent,
    ) -> Result<(), ChatError> {
        let mut body = render_content(content);
        body.insert("channel".into(), json!(locator.channel()));
        body.insert("ts".into(), json!(locator.ts()));
        let _: Value = self.post_json("chat.update", &Value::Object(body)).await?;
        debug!(message = %locator, "Updated message");
        Ok(())
    }

    async fn read_message(
        &self,
        locator: &MessageLocator,
    ) -> Result<Option<MessageContent>, ChatError> {
        let history: History = self
            .get_query(
                "conversations.history",
                &[
                    ("channel", locator.channel()),
                    ("latest", locator.ts()),
                    ("inclusive", "true"),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(history
            .messages
            .into_iter()
            .find(|m| m.ts == locator.ts())
            .map(RawMessage::into_content))
    }
}

/// Checks Slack's `{"ok": bool, "error": ...}` envelope and decodes the rest.
fn unwrap_envelope<T: DeserializeOwned>(method: &'static str, response: Value) -> Result<T, ChatError> {
    if response.get("ok").and_then(Value::as_bool) != Some(true) {
        let code = response
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        return Err(ChatError::Api { method, code });
    }
    serde_json::from_value(response).map_err(|e| ChatError::invalid_response(method, e))
}

/// Renders message content into the `text`/`blocks`/`attachments` fields of a
/// Slack request body.
fn render_content(content: &MessageContent) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("text".into(), json!(content.text));
    match &content.color {
        Some(color) => {
            body.insert(
                "attachments".into(),
                json!([{ "color": color, "blocks": content.blocks }]),
            );
        }
        None => {
            body.insert("blocks".into(), json!(content.blocks));
        }
    }
    body
}

#[derive(Debug, Deserialize)]
struct History {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    ts: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    color: Option<String>,
    #[serde(default)]
    blocks: Vec<Block>,
}

impl RawMessage {
    /// Reassembles the content a message was posted with. A colored message
    /// keeps its blocks in the first attachment.
    fn into_content(self) -> MessageContent {
        match self.attachments.into_iter().next() {
            Some(attachment) if attachment.color.is_some() || self.blocks.is_empty() => {
                MessageContent {
                    text: self.text,
                    color: attachment.color.map(normalize_color),
                    blocks: attachment.blocks,
                }
            }
            _ => MessageContent::new(self.text, self.blocks),
        }
    }
}

/// Slack reports attachment colors without the leading `#`.
fn normalize_color(color: String) -> String {
    if !color.starts_with('#') && color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit()) {
        format!("#{color}")
    } else {
        color
    }
}
