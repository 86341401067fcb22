//! Chat API error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The HTTP request failed or returned a non-success status.
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but reported an error (e.g. `channel_not_found`).
    #[error("chat API error in {method}: {code}")]
    Api { method: &'static str, code: String },

    /// The response did not have the expected shape.
    #[error("unexpected chat API response from {method}: {message}")]
    InvalidResponse {
        method: &'static str,
        message: String,
    },
}

impl ChatError {
    pub(super) fn invalid_response(method: &'static str, err: serde_json::Error) -> Self {
        ChatError::InvalidResponse {
            method,
            message: err.to_string(),
        }
    }
}
