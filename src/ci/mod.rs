//! CI collaborator: workflow run lookups and file fetches.
//!
//! [`CiApi`] is the seam the relay depends on; [`OctocrabClient`] implements
//! it against the GitHub REST API with retry on transient failures.

mod client;
mod error;
pub(crate) mod payload;
mod retry;

use std::future::Future;

use crate::types::{RepoId, WorkflowRun};

pub use client::OctocrabClient;
pub use error::{CiError, CiErrorKind};
pub use retry::{RetryConfig, retry_with_backoff};

/// Operations the relay needs from the CI provider.
pub trait CiApi {
    /// Fetches one attempt of a workflow run.
    fn fetch_run_attempt(
        &self,
        repo: &RepoId,
        run_id: u64,
        attempt: u32,
    ) -> impl Future<Output = Result<WorkflowRun, CiError>> + Send;

    /// Fetches a file's bytes as of `sha`. `Ok(None)` if it does not exist.
    fn fetch_file_at_commit(
        &self,
        repo: &RepoId,
        path: &str,
        sha: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, CiError>> + Send;
}
