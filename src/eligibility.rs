//! Per-run opt-in check.
//!
//! A workflow opts into notifications by setting a flag to the YAML boolean
//! `true` in its top-level `env` section:
//!
//! ```yaml
//! env:
//!   SLACK_NOTIFY: true
//! ```
//!
//! Anything else (a missing flag, the string `"true"`, a file that cannot be
//! fetched or parsed) means the run is not announced. The check runs once per
//! run, before its status message exists.

use thiserror::Error;
use tracing::{debug, warn};

use crate::ci::{CiApi, CiError};
use crate::types::{RepoId, WorkflowRun};

/// Default name of the opt-in flag in a workflow's `env` section.
pub const DEFAULT_OPT_IN_FLAG: &str = "SLACK_NOTIFY";

/// Reasons the workflow definition could not be inspected.
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("failed to fetch workflow definition: {0}")]
    Fetch(#[from] CiError),

    #[error("workflow definition {0} not found at the run's commit")]
    Missing(String),

    #[error("workflow definition is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("workflow definition is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl EligibilityError {
    /// True if asking again later could give a different answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, EligibilityError::Fetch(e) if e.kind.is_retriable())
    }
}

/// Outcome of checking a run's workflow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    /// The definition at the run's commit does not opt in. Final for the run.
    Ineligible,
    /// The definition could not be fetched; a later check may succeed.
    Undetermined,
}

/// Returns true if `run`'s workflow definition sets `flag: true` in `env`.
///
/// Never fails: every error is logged and treated as "not eligible".
pub async fn is_eligible<G: CiApi>(ci: &G, repo: &RepoId, run: &WorkflowRun, flag: &str) -> bool {
    check_eligibility(ci, repo, run, flag).await == Verdict::Eligible
}

/// Like [`is_eligible`], but keeps a transient fetch failure apart from a
/// definitive opt-out.
pub async fn check_eligibility<G: CiApi>(ci: &G, repo: &RepoId, run: &WorkflowRun, flag: &str) -> Verdict {
    match read_opt_in(ci, repo, run, flag).await {
        Ok(true) => Verdict::Eligible,
        Ok(false) => {
            debug!(repo = %repo, run_id = run.id, workflow = %run.path, flag, "Workflow has not opted in");
            Verdict::Ineligible
        }
        Err(e) => {
            warn!(repo = %repo, run_id = run.id, workflow = %run.path, error = %e, "Could not check opt-in flag");
            if e.is_transient() {
                Verdict::Undetermined
            } else {
                Verdict::Ineligible
            }
        }
    }
}

async fn read_opt_in<G: CiApi>(
    ci: &G,
    repo: &RepoId,
    run: &WorkflowRun,
    flag: &str,
) -> Result<bool, EligibilityError> {
    let bytes = ci
        .fetch_file_at_commit(repo, &run.path, &run.head_sha)
        .await?
        .ok_or_else(|| EligibilityError::Missing(run.path.clone()))?;
    let source = String::from_utf8(bytes)?;
    definition_opts_in(&source, flag)
}

/// Parses a workflow definition and checks `env.<flag>` is exactly `true`.
pub fn definition_opts_in(source: &str, flag: &str) -> Result<bool, EligibilityError> {
    let definition: serde_yaml::Value = serde_yaml::from_str(source)?;
    let value = definition.get("env").and_then(|env| env.get(flag));
    Ok(matches!(value, Some(serde_yaml::Value::Bool(true))))
}
