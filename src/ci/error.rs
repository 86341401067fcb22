//! CI provider API error types.
//!
//! Errors are split into transient (worth retrying) and permanent. Retrying
//! happens in [`super::retry`]; everything else just reports the error.

use std::fmt;
use thiserror::Error;

/// The kind of CI API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiErrorKind {
    /// Safe to retry with backoff: HTTP 5xx, 429, rate-limit 403s, network
    /// failures.
    Transient,

    /// Retrying will not help: most 4xx, malformed responses.
    Permanent,
}

impl CiErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, CiErrorKind::Transient)
    }
}

/// A CI API error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct CiError {
    pub kind: CiErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    pub message: String,

    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for CiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "CI API error (HTTP {}): {}", code, self.message),
            None => write!(f, "CI API error: {}", self.message),
        }
    }
}

impl CiError {
    /// Creates a permanent error without an octocrab source.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: CiErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: CiErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }

    /// Categorizes an octocrab error by HTTP status and message.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = extract_status_code(&err);
        let message = err.to_string();

        let kind = match status_code {
            Some(429) => CiErrorKind::Transient,
            Some(403) if is_rate_limit_error(&message) => CiErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => CiErrorKind::Transient,
            Some(_) => CiErrorKind::Permanent,
            None if is_network_error(&message) => CiErrorKind::Transient,
            None => CiErrorKind::Permanent,
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }
    status_code_from_message(&err.to_string())
}

/// Fallback for error variants that only carry the status in their message.
fn status_code_from_message(message: &str) -> Option<u16> {
    if let Some(idx) = message.find("status: ") {
        let digits: String = message[idx + 8..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }
    let lower = message.to_lowercase();
    if message.contains("404") && lower.contains("not found") {
        return Some(404);
    }
    [429u16, 403, 401, 500, 502, 503]
        .into_iter()
        .find(|code| message.contains(&code.to_string()))
}

fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("timed out")
        || message_lower.contains("connection")
        || message_lower.contains("dns")
}
