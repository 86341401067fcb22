//! Run completion: recolor the root message and post a summary.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::chat::{ChatApi, MessageContent};
use crate::ci::CiApi;
use crate::processor::EventHandler;
use crate::status::{color_for_conclusion, run_summary};
use crate::webhooks::{RelayEvent, RunCompletedEvent};

use super::{HandlerError, RelayState};

/// Handles `run.completed`.
pub struct RunCompletedHandler;

#[async_trait]
impl<C, G> EventHandler<RelayState<C, G>> for RunCompletedHandler
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    async fn handle(&self, state: &mut RelayState<C, G>, event: RelayEvent) -> Result<(), HandlerError> {
        match event {
            RelayEvent::RunCompleted(run) => handle_run_completed(state, run).await,
            other => Err(HandlerError::UnexpectedEvent(other.kind())),
        }
    }
}

#[instrument(skip_all, fields(run = %event.run_key(), conclusion = event.conclusion_or_unknown()))]
async fn handle_run_completed<C, G>(
    state: &mut RelayState<C, G>,
    event: RunCompletedEvent,
) -> Result<(), HandlerError>
where
    C: ChatApi + Send + Sync,
    G: CiApi + Send + Sync,
{
    // Runs that were never announced, or were evicted, stay silent.
    let Some(locator) = state.cache.get(&event.run_key()) else {
        debug!("No status message for run");
        return Ok(());
    };

    let Some(current) = state.chat.read_message(&locator).await? else {
        warn!(message = %locator, "Status message no longer exists, skipping completion");
        return Ok(());
    };

    let color = color_for_conclusion(event.conclusion.as_deref());
    if current.color.as_deref() == Some(color) {
        debug!("Run already marked complete");
        return Ok(());
    }

    let updated = MessageContent {
        color: Some(color.to_string()),
        ..current
    };
    state.chat.update_message(&locator, &updated).await?;

    let summary = run_summary(&event.run, event.conclusion_or_unknown());
    state
        .chat
        .post_message(locator.channel(), &summary, Some(locator.ts()))
        .await?;
    info!(message = %locator, "Marked run complete");
    Ok(())
}
