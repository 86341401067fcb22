//! Workflow run types as returned by the CI provider.

use serde::{Deserialize, Serialize};

/// A pull request associated with a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    /// Browser URL of the pull request.
    pub url: String,
}

/// The subset of a workflow run attempt the relay needs.
///
/// Fetched once per run (when no status message exists yet) to decide
/// eligibility and to render the message header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub run_attempt: u32,
    pub run_number: u64,
    /// Display name of the workflow.
    pub name: String,
    /// Path of the workflow definition, e.g. `.github/workflows/ci.yml`.
    pub path: String,
    pub head_sha: String,
    pub head_branch: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRef>,
}

impl WorkflowRun {
    /// Returns the commit SHA truncated for display.
    pub fn short_sha(&self) -> &str {
        self.head_sha.get(..7).unwrap_or(&self.head_sha)
    }
}
