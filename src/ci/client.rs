//! Octocrab-backed CI client.
//!
//! One client serves every repository the webhook is installed on; each call
//! names its repository explicitly.

use octocrab::Octocrab;

use crate::types::{RepoId, WorkflowRun};

use super::error::CiError;
use super::payload::RawWorkflowRun;
use super::retry::{RetryConfig, retry_with_backoff};
use super::CiApi;

/// A GitHub API client for workflow lookups.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    retry: RetryConfig,
}

impl OctocrabClient {
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            retry: RetryConfig::DEFAULT,
        }
    }

    /// Creates a client from a GitHub token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client))
    }

    async fn get_run(&self, repo: &RepoId, run_id: u64, attempt: u32) -> Result<WorkflowRun, CiError> {
        let route = format!(
            "/repos/{}/{}/actions/runs/{}/attempts/{}",
            repo.owner, repo.repo, run_id, attempt
        );
        let raw: RawWorkflowRun = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(CiError::from_octocrab)?;
        Ok(raw.into_run(repo))
    }

    async fn get_file(&self, repo: &RepoId, path: &str, sha: &str) -> Result<Option<Vec<u8>>, CiError> {
        let result = self
            .client
            .repos(&repo.owner, &repo.repo)
            .get_content()
            .path(path)
            .r#ref(sha)
            .send()
            .await;

        let mut items = match result {
            Ok(items) => items,
            Err(e) => {
                let err = CiError::from_octocrab(e);
                return if err.is_not_found() { Ok(None) } else { Err(err) };
            }
        };

        // A directory listing has several entries; a file has exactly one.
        let mut entries = items.take_items();
        if entries.len() != 1 {
            return Ok(None);
        }
        let file = entries.remove(0);
        if file.r#type != "file" {
            return Ok(None);
        }
        file.decoded_content()
            .map(|content| Some(content.into_bytes()))
            .ok_or_else(|| CiError::permanent(format!("could not decode contents of {path}")))
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl CiApi for OctocrabClient {
    async fn fetch_run_attempt(
        &self,
        repo: &RepoId,
        run_id: u64,
        attempt: u32,
    ) -> Result<WorkflowRun, CiError> {
        retry_with_backoff(self.retry, || self.get_run(repo, run_id, attempt)).await
    }

    async fn fetch_file_at_commit(
        &self,
        repo: &RepoId,
        path: &str,
        sha: &str,
    ) -> Result<Option<Vec<u8>>, CiError> {
        retry_with_backoff(self.retry, || self.get_file(repo, path, sha)).await
    }
}
