//! Workflow events the relay handles.
//!
//! GitHub delivers two webhook types we care about:
//!
//! - `workflow_job` - a job was queued, started, or completed
//! - `workflow_run` - a run completed (the other actions are ignored)
//!
//! Each parsed event carries the [`RunKey`] it belongs to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RepoId, RunKey, WorkflowRun};

/// The kinds of event handlers can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    JobQueued,
    JobInProgress,
    JobCompleted,
    RunCompleted,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::JobQueued,
        EventKind::JobInProgress,
        EventKind::JobCompleted,
        EventKind::RunCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JobQueued => "job.queued",
            EventKind::JobInProgress => "job.in_progress",
            EventKind::JobCompleted => "job.completed",
            EventKind::RunCompleted => "run.completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed workflow event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayEvent {
    Job(JobEvent),
    RunCompleted(RunCompletedEvent),
}

impl RelayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RelayEvent::Job(e) => e.action.kind(),
            RelayEvent::RunCompleted(_) => EventKind::RunCompleted,
        }
    }

    pub fn run_key(&self) -> RunKey {
        match self {
            RelayEvent::Job(e) => e.run_key(),
            RelayEvent::RunCompleted(e) => e.run_key(),
        }
    }

    pub fn repo(&self) -> &RepoId {
        match self {
            RelayEvent::Job(e) => &e.repo,
            RelayEvent::RunCompleted(e) => &e.repo,
        }
    }
}

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Queued,
    InProgress,
    Completed,
}

impl JobAction {
    pub fn kind(&self) -> EventKind {
        match self {
            JobAction::Queued => EventKind::JobQueued,
            JobAction::InProgress => EventKind::JobInProgress,
            JobAction::Completed => EventKind::JobCompleted,
        }
    }
}

/// A `workflow_job` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub repo: RepoId,
    pub action: JobAction,
    pub run_id: u64,
    pub run_attempt: u32,
    pub job_id: u64,
    pub name: String,
    /// Browser URL of the job; identifies the job within its message.
    pub html_url: String,
    /// Raw GitHub status (`queued`, `in_progress`, `completed`, ...).
    pub status: String,
    /// Raw GitHub conclusion, set once completed.
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobEvent {
    pub fn run_key(&self) -> RunKey {
        RunKey::new(self.run_id, self.run_attempt)
    }
}

/// A `workflow_run` event with action `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    pub repo: RepoId,
    pub run: WorkflowRun,
    pub conclusion: Option<String>,
}

impl RunCompletedEvent {
    pub fn run_key(&self) -> RunKey {
        RunKey::new(self.run.id, self.run.run_attempt)
    }

    /// The conclusion for display; GitHub omits it only in malformed payloads.
    pub fn conclusion_or_unknown(&self) -> &str {
        self.conclusion.as_deref().unwrap_or("unknown")
    }
}
