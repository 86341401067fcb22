//! Job states and how a job line is rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blocks::JobElement;

/// A `(status, conclusion)` pair outside the supported table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported job state: status={status:?}, conclusion={conclusion:?}")]
pub struct InvalidJobState {
    pub status: String,
    pub conclusion: Option<String>,
}

/// The displayed state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failure,
    Cancelled,
}

impl JobState {
    const ALL: [JobState; 5] = [
        JobState::Pending,
        JobState::Running,
        JobState::Success,
        JobState::Failure,
        JobState::Cancelled,
    ];

    /// Maps GitHub's job `status` and `conclusion` onto a displayable state.
    ///
    /// The conclusion only matters once the job is `completed`.
    pub fn from_parts(status: &str, conclusion: Option<&str>) -> Result<Self, InvalidJobState> {
        match (status, conclusion) {
            ("queued", _) => Ok(JobState::Pending),
            ("in_progress", _) => Ok(JobState::Running),
            ("completed", Some("success")) => Ok(JobState::Success),
            ("completed", Some("failure")) => Ok(JobState::Failure),
            ("completed", Some("cancelled")) => Ok(JobState::Cancelled),
            _ => Err(InvalidJobState {
                status: status.to_string(),
                conclusion: conclusion.map(str::to_string),
            }),
        }
    }

    /// The Slack emoji shortcode shown for this state.
    pub fn emoji(self) -> &'static str {
        match self {
            JobState::Pending => ":hourglass_flowing_sand:",
            JobState::Running => ":arrows_counterclockwise:",
            JobState::Success => ":white_check_mark:",
            JobState::Failure => ":x:",
            JobState::Cancelled => ":no_entry_sign:",
        }
    }

    /// Terminal states are sticky: once shown they are never overwritten.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Success | JobState::Failure | JobState::Cancelled
        )
    }

    /// Recovers the state from a rendered line's leading emoji.
    pub fn from_rendered(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        Self::ALL.into_iter().find(|s| s.emoji() == first)
    }
}

/// A job update ready to be merged into a status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLine {
    pub name: String,
    pub url: String,
    pub state: JobState,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobLine {
    /// Renders the line as `"{emoji} <{url}|{name}>"`, plus `" ({m}:{ss})"`
    /// when the job has a completion time.
    pub fn render(&self) -> JobElement {
        let mut text = format!(
            "{} <{}|{}>",
            self.state.emoji(),
            self.url,
            escape_mrkdwn(&self.name)
        );
        if let Some(elapsed) = self.elapsed() {
            text.push_str(&format!(" ({elapsed})"));
        }
        JobElement {
            url: self.url.clone(),
            text,
        }
    }

    /// `completed_at - started_at` as `m:ss`, if the job has completed.
    ///
    /// A missing start time or a clock skew making the duration negative
    /// renders as `0:00`.
    pub fn elapsed(&self) -> Option<String> {
        let completed = self.completed_at?;
        let secs = self
            .started_at
            .map(|started| (completed - started).num_seconds().max(0))
            .unwrap_or(0);
        Some(format_elapsed(secs))
    }
}

/// Formats whole seconds as `minutes:seconds` with two-digit seconds.
pub fn format_elapsed(secs: i64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Escapes the three characters Slack mrkdwn treats as control characters.
pub fn escape_mrkdwn(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
