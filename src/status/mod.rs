//! Status message content.
//!
//! A run's root message is a header followed by job containers, each holding
//! up to [`JOB_BLOCK_LIMIT`] job lines. Job lines are folded in one update at
//! a time by [`upsert_job`]; a line that reached a terminal state never
//! changes again.
//!
//! # Module Structure
//!
//! - [`blocks`]: Block Kit representation and job-container recognition
//! - [`job`]: job states, emoji and line rendering
//! - [`merge`]: the upsert and re-chunking algorithm
//! - [`format`]: header, reply and summary layouts

pub mod blocks;
pub mod format;
pub mod job;
pub mod merge;

pub use blocks::{Block, JOB_BLOCK_ID_PREFIX, JOB_BLOCK_LIMIT, JobElement, JobsBlock, job_elements};
pub use format::{
    COLOR_FAILURE, COLOR_NEUTRAL, COLOR_RUNNING, COLOR_SUCCESS, color_for_conclusion,
    failure_reply, header_blocks, root_text, run_summary,
};
pub use job::{InvalidJobState, JobLine, JobState};
pub use merge::upsert_job;
