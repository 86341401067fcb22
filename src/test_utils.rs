//! Shared test fixtures: in-memory collaborators and sample payloads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use crate::chat::{ChatApi, ChatError, MessageContent};
use crate::ci::{CiApi, CiError};
use crate::types::{MessageLocator, PostedMessage, PullRequestRef, RepoId, WorkflowRun};
use crate::webhooks::{JobAction, JobEvent, RelayEvent, RunCompletedEvent};

pub const CHANNEL: &str = "C0123456789";

pub fn repo() -> RepoId {
    RepoId::new("octo", "hello")
}

pub fn sample_run(id: u64, attempt: u32) -> WorkflowRun {
    WorkflowRun {
        id,
        run_attempt: attempt,
        run_number: 42,
        name: "CI".to_string(),
        path: ".github/workflows/ci.yml".to_string(),
        head_sha: "4f9c2a1b7e3d5c6a8b9d0e1f2a3b4c5d6e7f8a9b".to_string(),
        head_branch: Some("feature/login".to_string()),
        html_url: format!("https://github.com/octo/hello/actions/runs/{id}"),
        pull_requests: vec![PullRequestRef {
            number: 12,
            url: "https://github.com/octo/hello/pull/12".to_string(),
        }],
    }
}

pub fn job_url(run_id: u64, job_id: u64) -> String {
    format!("https://github.com/octo/hello/actions/runs/{run_id}/job/{job_id}")
}

fn started_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// 65 seconds after [`started_at`].
fn completed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 5).unwrap()
}

/// A job event for attempt 1 of `run_id`. Status follows from `action`.
pub fn job_event(
    run_id: u64,
    job_id: u64,
    name: &str,
    action: JobAction,
    conclusion: Option<&str>,
) -> RelayEvent {
    let (status, started, completed) = match action {
        JobAction::Queued => ("queued", None, None),
        JobAction::InProgress => ("in_progress", Some(started_at()), None),
        JobAction::Completed => ("completed", Some(started_at()), Some(completed_at())),
    };
    RelayEvent::Job(JobEvent {
        repo: repo(),
        action,
        run_id,
        run_attempt: 1,
        job_id,
        name: name.to_string(),
        html_url: job_url(run_id, job_id),
        status: status.to_string(),
        conclusion: conclusion.map(str::to_string),
        started_at: started,
        completed_at: completed,
    })
}

pub fn run_completed_event(run: WorkflowRun, conclusion: &str) -> RelayEvent {
    RelayEvent::RunCompleted(RunCompletedEvent {
        repo: repo(),
        run,
        conclusion: Some(conclusion.to_string()),
    })
}

fn repository_json() -> Value {
    json!({
        "id": 1296269,
        "name": "hello",
        "full_name": "octo/hello",
        "owner": { "login": "octo", "id": 1 }
    })
}

/// A `workflow_job` webhook body.
pub fn workflow_job_payload(
    action: &str,
    run_id: u64,
    attempt: u32,
    job_id: u64,
    name: &str,
    conclusion: Option<&str>,
) -> Value {
    let status = match action {
        "completed" => "completed",
        "in_progress" => "in_progress",
        "waiting" => "waiting",
        _ => "queued",
    };
    let completed = (action == "completed").then(|| "2024-05-01T12:01:05Z");
    json!({
        "action": action,
        "workflow_job": {
            "id": job_id,
            "run_id": run_id,
            "run_attempt": attempt,
            "workflow_name": "CI",
            "head_sha": "4f9c2a1b7e3d5c6a8b9d0e1f2a3b4c5d6e7f8a9b",
            "name": name,
            "html_url": job_url(run_id, job_id),
            "status": status,
            "conclusion": conclusion,
            "started_at": "2024-05-01T12:00:00Z",
            "completed_at": completed,
            "steps": []
        },
        "repository": repository_json(),
        "sender": { "login": "octocat" }
    })
}

/// A `workflow_run` webhook body.
pub fn workflow_run_payload(action: &str, run_id: u64, attempt: u32, conclusion: Option<&str>) -> Value {
    json!({
        "action": action,
        "workflow_run": {
            "id": run_id,
            "name": "CI",
            "run_attempt": attempt,
            "run_number": 42,
            "path": ".github/workflows/ci.yml",
            "head_sha": "4f9c2a1b7e3d5c6a8b9d0e1f2a3b4c5d6e7f8a9b",
            "head_branch": "feature/login",
            "html_url": format!("https://github.com/octo/hello/actions/runs/{run_id}"),
            "status": "completed",
            "conclusion": conclusion,
            "pull_requests": [
                { "number": 12, "url": "https://api.github.com/repos/octo/hello/pulls/12" }
            ]
        },
        "repository": repository_json(),
        "sender": { "login": "octocat" }
    })
}

// ============================================================================
// Chat
// ============================================================================

/// A message posted through [`MockChat`].
#[derive(Debug, Clone)]
pub struct Post {
    pub channel: String,
    pub content: MessageContent,
    pub thread_ts: Option<String>,
    pub ts: String,
}

#[derive(Debug, Default)]
struct ChatLog {
    next_ts: u64,
    messages: HashMap<String, MessageContent>,
    posts: Vec<Post>,
    updates: Vec<(MessageLocator, MessageContent)>,
    reads: usize,
    fail_posts: bool,
    malformed_ts: bool,
}

/// In-memory chat service. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockChat {
    log: Arc<Mutex<ChatLog>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every post fails with an API error.
    pub fn failing_posts(self) -> Self {
        self.log.lock().unwrap().fail_posts = true;
        self
    }

    /// Posts succeed but report a timestamp the cache rejects.
    pub fn malformed_timestamps(self) -> Self {
        self.log.lock().unwrap().malformed_ts = true;
        self
    }

    pub fn posts(&self) -> Vec<Post> {
        self.log.lock().unwrap().posts.clone()
    }

    /// Top-level posts, in order.
    pub fn root_posts(&self) -> Vec<Post> {
        self.posts().into_iter().filter(|p| p.thread_ts.is_none()).collect()
    }

    /// Threaded replies, in order.
    pub fn replies(&self) -> Vec<Post> {
        self.posts().into_iter().filter(|p| p.thread_ts.is_some()).collect()
    }

    pub fn updates(&self) -> Vec<(MessageLocator, MessageContent)> {
        self.log.lock().unwrap().updates.clone()
    }

    pub fn reads(&self) -> usize {
        self.log.lock().unwrap().reads
    }

    /// Current content of the message at `ts`.
    pub fn message(&self, ts: &str) -> Option<MessageContent> {
        self.log.lock().unwrap().messages.get(ts).cloned()
    }

    /// Deletes a message, as a channel member could.
    pub fn delete_message(&self, ts: &str) {
        self.log.lock().unwrap().messages.remove(ts);
    }

    /// Total calls that changed the channel.
    pub fn writes(&self) -> usize {
        let log = self.log.lock().unwrap();
        log.posts.len() + log.updates.len()
    }
}

impl ChatApi for MockChat {
    async fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, ChatError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_posts {
            return Err(ChatError::Api {
                method: "chat.postMessage",
                code: "channel_not_found".to_string(),
            });
        }
        log.next_ts += 1;
        let ts = if log.malformed_ts {
            format!("bogus-{}", log.next_ts)
        } else {
            format!("1714564800.{:06}", log.next_ts)
        };
        if thread_ts.is_none() {
            log.messages.insert(ts.clone(), content.clone());
        }
        log.posts.push(Post {
            channel: channel.to_string(),
            content: content.clone(),
            thread_ts: thread_ts.map(str::to_string),
            ts: ts.clone(),
        });
        Ok(PostedMessage::new(channel, ts))
    }

    async fn update_message(
        &self,
        locator: &MessageLocator,
        content: &MessageContent,
    ) -> Result<(), ChatError> {
        let mut log = self.log.lock().unwrap();
        if !log.messages.contains_key(locator.ts()) {
            return Err(ChatError::Api {
                method: "chat.update",
                code: "message_not_found".to_string(),
            });
        }
        log.messages.insert(locator.ts().to_string(), content.clone());
        log.updates.push((locator.clone(), content.clone()));
        Ok(())
    }

    async fn read_message(&self, locator: &MessageLocator) -> Result<Option<MessageContent>, ChatError> {
        let mut log = self.log.lock().unwrap();
        log.reads += 1;
        Ok(log.messages.get(locator.ts()).cloned())
    }
}

// ============================================================================
// CI
// ============================================================================

#[derive(Debug, Default)]
struct CiLog {
    run_requests: Vec<(u64, u32)>,
    file_requests: Vec<(String, String)>,
}

/// In-memory CI provider serving one run template and one workflow file.
#[derive(Debug, Clone)]
pub struct MockCi {
    run: WorkflowRun,
    workflow: Option<String>,
    fail_runs: bool,
    fail_files: bool,
    log: Arc<Mutex<CiLog>>,
}

impl MockCi {
    /// Serves `run` (with the requested id and attempt) and no workflow file.
    pub fn new(run: WorkflowRun) -> Self {
        MockCi {
            run,
            workflow: None,
            fail_runs: false,
            fail_files: false,
            log: Arc::default(),
        }
    }

    /// A provider whose workflow opts in with the default flag.
    pub fn opted_in(run: WorkflowRun) -> Self {
        Self::new(run).with_workflow("name: CI\non: push\nenv:\n  SLACK_NOTIFY: true\njobs: {}\n")
    }

    pub fn with_workflow(mut self, yaml: &str) -> Self {
        self.workflow = Some(yaml.to_string());
        self
    }

    pub fn failing_run_fetch(mut self) -> Self {
        self.fail_runs = true;
        self
    }

    pub fn failing_file_fetch(mut self) -> Self {
        self.fail_files = true;
        self
    }

    pub fn run_requests(&self) -> Vec<(u64, u32)> {
        self.log.lock().unwrap().run_requests.clone()
    }

    pub fn file_requests(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().file_requests.clone()
    }
}

impl CiApi for MockCi {
    async fn fetch_run_attempt(
        &self,
        _repo: &RepoId,
        run_id: u64,
        attempt: u32,
    ) -> Result<WorkflowRun, CiError> {
        self.log.lock().unwrap().run_requests.push((run_id, attempt));
        if self.fail_runs {
            return Err(CiError::permanent("run lookup failed"));
        }
        Ok(WorkflowRun {
            id: run_id,
            run_attempt: attempt,
            ..self.run.clone()
        })
    }

    async fn fetch_file_at_commit(
        &self,
        _repo: &RepoId,
        path: &str,
        sha: &str,
    ) -> Result<Option<Vec<u8>>, CiError> {
        self.log
            .lock()
            .unwrap()
            .file_requests
            .push((path.to_string(), sha.to_string()));
        if self.fail_files {
            return Err(CiError::transient("connection reset"));
        }
        Ok(self.workflow.as_ref().map(|yaml| yaml.clone().into_bytes()))
    }
}
