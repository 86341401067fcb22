//! Message layouts for run status.
//!
//! The root message is a header followed by job containers. Failure and
//! completion notices are posted as threaded replies to it.

use serde_json::json;

use crate::chat::MessageContent;
use crate::types::{RepoId, WorkflowRun};

use super::blocks::Block;
use super::job::{JobLine, escape_mrkdwn};

/// Sidebar color while a run is in progress.
pub const COLOR_RUNNING: &str = "#dbab09";
pub const COLOR_SUCCESS: &str = "#2eb886";
pub const COLOR_FAILURE: &str = "#a30200";
/// Sidebar color for cancelled, skipped, timed-out and unknown conclusions.
pub const COLOR_NEUTRAL: &str = "#808080";

/// Maps a run conclusion onto the root message's sidebar color.
pub fn color_for_conclusion(conclusion: Option<&str>) -> &'static str {
    match conclusion {
        Some("success") => COLOR_SUCCESS,
        Some("failure") => COLOR_FAILURE,
        _ => COLOR_NEUTRAL,
    }
}

/// Notification fallback text for a run's root message.
pub fn root_text(repo: &RepoId, run: &WorkflowRun) -> String {
    format!("{} #{} in {}", run.name, run.run_number, repo)
}

/// The blocks a root message starts with: a title linking to the run and a
/// context line naming the repository, branch and commit.
pub fn header_blocks(repo: &RepoId, run: &WorkflowRun) -> Vec<Block> {
    let title = format!(
        "*<{}|{} #{}>*",
        run.html_url,
        escape_mrkdwn(&run.name),
        run.run_number
    );

    let mut context = vec![json!({ "type": "mrkdwn", "text": format!("*{repo}*") })];
    if let Some(branch) = &run.head_branch {
        context.push(json!({ "type": "mrkdwn", "text": format!("`{}`", escape_mrkdwn(branch)) }));
    }
    context.push(json!({ "type": "mrkdwn", "text": format!("`{}`", run.short_sha()) }));
    if let Some(prs) = pull_request_links(run) {
        context.push(json!({ "type": "mrkdwn", "text": prs }));
    }

    vec![
        Block::Other(json!({
            "type": "section",
            "block_id": "header-title",
            "text": { "type": "mrkdwn", "text": title },
        })),
        Block::Other(json!({
            "type": "context",
            "block_id": "header-context",
            "elements": context,
        })),
    ]
}

/// Threaded reply announcing a failed job.
pub fn failure_reply(job: &JobLine) -> MessageContent {
    let text = format!("{} failure", job.name);
    let body = format!(
        "{} <{}|{}> failed",
        job.state.emoji(),
        job.url,
        escape_mrkdwn(&job.name)
    );
    MessageContent::new(text, vec![section(body)])
}

/// Threaded reply summarizing a completed run.
pub fn run_summary(run: &WorkflowRun, conclusion: &str) -> MessageContent {
    let text = format!("{} {}", run.name, conclusion);
    let mut body = format!(
        "<{}|{}> finished: *{}*",
        run.html_url,
        escape_mrkdwn(&run.name),
        conclusion
    );
    if let Some(prs) = pull_request_links(run) {
        body.push('\n');
        body.push_str(&prs);
    }
    MessageContent::new(text, vec![section(body)])
}

fn pull_request_links(run: &WorkflowRun) -> Option<String> {
    if run.pull_requests.is_empty() {
        return None;
    }
    let links: Vec<String> = run
        .pull_requests
        .iter()
        .map(|pr| format!("<{}|#{}>", pr.url, pr.number))
        .collect();
    Some(links.join(", "))
}

fn section(text: String) -> Block {
    Block::Other(json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::job::JobState;
    use crate::test_utils::{repo, sample_run};

    #[test]
    fn conclusion_colors() {
        assert_eq!(color_for_conclusion(Some("success")), COLOR_SUCCESS);
        assert_eq!(color_for_conclusion(Some("failure")), COLOR_FAILURE);
        assert_eq!(color_for_conclusion(Some("cancelled")), COLOR_NEUTRAL);
        assert_eq!(color_for_conclusion(None), COLOR_NEUTRAL);
    }

    #[test]
    fn header_is_never_a_job_container() {
        let blocks = header_blocks(&repo(), &sample_run(1, 1));
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| !b.is_jobs()));

        // Survives a round trip through JSON as opaque blocks.
        let json = serde_json::to_value(&blocks).unwrap();
        let back: Vec<Block> = serde_json::from_value(json).unwrap();
        assert_eq!(back, blocks);
    }

    #[test]
    fn header_mentions_branch_commit_and_prs() {
        let run = sample_run(1, 1);
        let json = serde_json::to_string(&header_blocks(&repo(), &run)).unwrap();
        assert!(json.contains("octo/hello"));
        assert!(json.contains(run.short_sha()));
        assert!(json.contains("#12"));
        assert!(json.contains(&run.html_url));
    }

    #[test]
    fn header_without_branch() {
        let mut run = sample_run(1, 1);
        run.head_branch = None;
        run.pull_requests.clear();
        let blocks = header_blocks(&repo(), &run);
        let Block::Other(context) = &blocks[1] else {
            panic!("expected opaque context block");
        };
        assert_eq!(context["elements"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn failure_reply_text() {
        let job = JobLine {
            name: "lint".to_string(),
            url: "https://github.com/octo/hello/actions/runs/1/job/3".to_string(),
            state: JobState::Failure,
            started_at: None,
            completed_at: None,
        };
        let reply = failure_reply(&job);
        assert_eq!(reply.text, "lint failure");
        assert_eq!(reply.color, None);
        assert!(serde_json::to_string(&reply.blocks).unwrap().contains(&job.url));
    }

    #[test]
    fn summary_links_pull_requests() {
        let run = sample_run(1, 1);
        let summary = run_summary(&run, "success");
        assert_eq!(summary.text, "CI success");
        let json = serde_json::to_string(&summary.blocks).unwrap();
        assert!(json.contains("https://github.com/octo/hello/pull/12"));
    }
}
