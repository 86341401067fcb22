//! Webhook endpoint handler.
//!
//! Authenticates GitHub deliveries, parses them, and enqueues the resulting
//! events. Returns as soon as the event is queued; handling happens on the
//! processor task.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::processor::ProcessorClosed;
use crate::webhooks::{ParseError, parse_webhook, verify_signature};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// The relay is shutting down.
    #[error("{0}")]
    Closed(#[from] ProcessorClosed),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Closed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: event type (`workflow_job`, `workflow_run`, ...)
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the body
/// - Optional: `X-GitHub-Delivery`, used only for logging
///
/// # Response
///
/// - 202 Accepted: event queued, or an event type the relay ignores
/// - 400 Bad Request: missing header or malformed payload
/// - 401 Unauthorized: invalid signature
/// - 503 Service Unavailable: shutting down
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;
    let delivery_id = get_header(&headers, HEADER_DELIVERY).unwrap_or_else(|_| "-".to_string());

    debug!(delivery_id = %delivery_id, event_type = %event_type, "Received webhook");

    // Authenticate before parsing anything.
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let event = match parse_webhook(&event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring webhook");
            return Ok((StatusCode::ACCEPTED, "Ignored"));
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook payload");
            return Err(e.into());
        }
    };

    let kind = event.kind();
    let run = event.run_key();
    let repo = event.repo().clone();
    app_state.queue().enqueue(event)?;

    info!(
        delivery_id = %delivery_id,
        repo = %repo,
        run = %run,
        kind = %kind,
        "Webhook queued"
    );
    Ok((StatusCode::ACCEPTED, "Accepted"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
