//! GitHub webhook payload parser.
//!
//! Parses raw webhook JSON into typed [`RelayEvent`] values.
//!
//! 1. The event type comes from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types and uninteresting actions return `Ok(None)`
//! 4. Malformed payloads return `Err` with details

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::ci::payload::RawWorkflowRun;
use crate::types::RepoId;

use super::events::{JobAction, JobEvent, RelayEvent, RunCompletedEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` - a job or run-completion event
/// * `Ok(None)` - an event type or action the relay ignores
/// * `Err(e)` - malformed payload
///
/// # Examples
///
/// ```
/// use workflow_relay::webhooks::parse_webhook;
///
/// let payload = br#"{"zen": "Keep it logically awesome.", "hook_id": 1}"#;
/// assert!(parse_webhook("ping", payload).unwrap().is_none());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<RelayEvent>, ParseError> {
    match event_type {
        "workflow_job" => parse_workflow_job(payload).map(|e| e.map(RelayEvent::Job)),
        "workflow_run" => parse_workflow_run(payload).map(|e| e.map(RelayEvent::RunCompleted)),
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

impl RawRepository {
    fn into_repo_id(self) -> RepoId {
        RepoId::new(self.owner.login, self.name)
    }
}

// ============================================================================
// workflow_job event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWorkflowJobPayload {
    action: String,
    workflow_job: RawWorkflowJob,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawWorkflowJob {
    id: u64,
    run_id: u64,
    run_attempt: Option<u32>,
    name: String,
    html_url: String,
    status: String,
    conclusion: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

fn parse_workflow_job(payload: &[u8]) -> Result<Option<JobEvent>, ParseError> {
    let raw: RawWorkflowJobPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "queued" => JobAction::Queued,
        "in_progress" => JobAction::InProgress,
        "completed" => JobAction::Completed,
        // `waiting` (environment protection) and future actions.
        _ => return Ok(None),
    };

    let job = raw.workflow_job;
    Ok(Some(JobEvent {
        repo: raw.repository.into_repo_id(),
        action,
        run_id: job.run_id,
        run_attempt: job.run_attempt.unwrap_or(1),
        job_id: job.id,
        name: job.name,
        html_url: job.html_url,
        status: job.status,
        conclusion: job.conclusion,
        started_at: job.started_at,
        completed_at: job.completed_at,
    }))
}

// ============================================================================
// workflow_run event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWorkflowRunPayload {
    action: String,
    workflow_run: RawWorkflowRun,
    repository: RawRepository,
}

fn parse_workflow_run(payload: &[u8]) -> Result<Option<RunCompletedEvent>, ParseError> {
    let raw: RawWorkflowRunPayload = serde_json::from_slice(payload)?;
    if raw.action != "completed" {
        return Ok(None);
    }

    let repo = raw.repository.into_repo_id();
    let conclusion = raw.workflow_run.conclusion.clone();
    let run = raw.workflow_run.into_run(&repo);
    Ok(Some(RunCompletedEvent {
        repo,
        run,
        conclusion,
    }))
}
