//! Core domain types for the workflow relay.

pub mod ids;
pub mod run;

// Re-export commonly used types at the module level
pub use ids::{MessageLocator, PostedMessage, RepoId, RunKey, ValidationError};
pub use run::{PullRequestRef, WorkflowRun};
