//! Raw GitHub workflow-run JSON, shared by the REST client and the webhook
//! parser (both deliver the same object).

use serde::Deserialize;

use crate::types::{PullRequestRef, RepoId, WorkflowRun};

#[derive(Debug, Deserialize)]
pub(crate) struct RawWorkflowRun {
    pub id: u64,
    pub run_attempt: Option<u32>,
    pub run_number: u64,
    pub name: Option<String>,
    pub path: String,
    pub head_sha: String,
    pub head_branch: Option<String>,
    pub html_url: String,
    pub conclusion: Option<String>,
    #[serde(default)]
    pub pull_requests: Vec<RawRunPullRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRunPullRequest {
    pub number: u64,
}

impl RawWorkflowRun {
    /// Converts into the relay's run type.
    ///
    /// The run payload only carries API URLs for its pull requests, so
    /// browser URLs are derived from the repository.
    pub fn into_run(self, repo: &RepoId) -> WorkflowRun {
        let name = self.name.unwrap_or_else(|| self.path.clone());
        WorkflowRun {
            id: self.id,
            run_attempt: self.run_attempt.unwrap_or(1),
            run_number: self.run_number,
            name,
            path: self.path,
            head_sha: self.head_sha,
            head_branch: self.head_branch,
            html_url: self.html_url,
            pull_requests: self
                .pull_requests
                .into_iter()
                .map(|pr| PullRequestRef {
                    number: pr.number,
                    url: format!("https://github.com/{}/{}/pull/{}", repo.owner, repo.repo, pr.number),
                })
                .collect(),
        }
    }
}
