//! Job events: admit the run or fold the job into its message.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::chat::{ChatApi, MessageContent};
use crate::ci::CiApi;
use crate::eligibility::{Verdict, check_eligibility};
use crate::processor::EventHandler;
use crate::status::{
    COLOR_RUNNING, JobLine, JobState, failure_reply, header_blocks, root_text, upsert_job,
};
use crate::types::MessageLocator;
use crate::webhooks::{JobEvent, RelayEvent};

use super::{HandlerError, RelayState};

/// Handles `job.queued`, `job.in_progress` and `job.completed`.
pub struct JobHandler;

#[async_trait]
impl<C, G> EventHandler<RelayState<C, G>> for JobHandler
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    async fn handle(&self, state: &mut RelayState<C, G>, event: RelayEvent) -> Result<(), HandlerError> {
        match event {
            RelayEvent::Job(job) => handle_job(state, job).await,
            other => Err(HandlerError::UnexpectedEvent(other.kind())),
        }
    }
}

fn job_line(job: &JobEvent) -> Result<JobLine, HandlerError> {
    let state = JobState::from_parts(&job.status, job.conclusion.as_deref())?;
    Ok(JobLine {
        name: job.name.clone(),
        url: job.html_url.clone(),
        state,
        started_at: job.started_at,
        completed_at: job.completed_at,
    })
}

#[instrument(skip_all, fields(run = %job.run_key(), job = %job.name))]
async fn handle_job<C, G>(state: &mut RelayState<C, G>, job: JobEvent) -> Result<(), HandlerError>
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    let line = job_line(&job)?;
    let key = job.run_key();
    if let Some(locator) = state.cache.get(&key) {
        return update_message(state, &locator, &line).await;
    }
    if state.rejected.get(&key).is_some() {
        debug!("Run did not opt in, skipping");
        return Ok(());
    }
    admit_run(state, &job, &line).await
}

/// Folds `line` into an existing status message.
async fn update_message<C, G>(
    state: &RelayState<C, G>,
    locator: &MessageLocator,
    line: &JobLine,
) -> Result<(), HandlerError>
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    let Some(current) = state.chat.read_message(locator).await? else {
        warn!(message = %locator, "Status message no longer exists, skipping update");
        return Ok(());
    };

    let blocks = upsert_job(&current.blocks, line);
    if blocks == current.blocks {
        debug!(state = ?line.state, "Job line unchanged");
        return Ok(());
    }

    let updated = MessageContent { blocks, ..current };
    state.chat.update_message(locator, &updated).await?;
    debug!(state = ?line.state, "Updated status message");

    // A changed line only reaches Failure once; terminal lines are sticky.
    if line.state == JobState::Failure {
        post_failure_reply(state, locator.channel(), locator.ts(), line).await?;
    }
    Ok(())
}

/// Checks eligibility for an unseen run and posts its root message.
async fn admit_run<C, G>(
    state: &mut RelayState<C, G>,
    job: &JobEvent,
    line: &JobLine,
) -> Result<(), HandlerError>
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    let run = state
        .ci
        .fetch_run_attempt(&job.repo, job.run_id, job.run_attempt)
        .await?;
    match check_eligibility(&state.ci, &job.repo, &run, &state.opt_in_flag).await {
        Verdict::Eligible => {}
        Verdict::Ineligible => {
            state.rejected.insert(job.run_key(), ());
            return Ok(());
        }
        Verdict::Undetermined => return Ok(()),
    }

    let blocks = upsert_job(&header_blocks(&job.repo, &run), line);
    let content = MessageContent::new(root_text(&job.repo, &run), blocks).with_color(COLOR_RUNNING);
    let posted = state.chat.post_message(&state.channel, &content, None).await?;

    let locator = MessageLocator::try_from(posted.clone())?;
    state.cache.set(job.run_key(), posted)?;
    info!(message = %locator, workflow = %run.name, "Posted status message");

    if line.state == JobState::Failure {
        post_failure_reply(state, locator.channel(), locator.ts(), line).await?;
    }
    Ok(())
}

async fn post_failure_reply<C, G>(
    state: &RelayState<C, G>,
    channel: &str,
    thread_ts: &str,
    line: &JobLine,
) -> Result<(), HandlerError>
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    state
        .chat
        .post_message(channel, &failure_reply(line), Some(thread_ts))
        .await?;
    info!(job = %line.name, "Posted failure reply");
    Ok(())
}
