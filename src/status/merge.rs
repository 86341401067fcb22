//! Folding job updates into a status message's blocks.
//!
//! [`upsert_job`] is pure: the same blocks and job always produce the same
//! output. Job lines keep their first-seen order, terminal lines are never
//! overwritten, and lines are repacked into containers of at most
//! [`JOB_BLOCK_LIMIT`] after every update.

use super::blocks::{Block, JOB_BLOCK_LIMIT, JobElement, JobsBlock};
use super::job::JobLine;

/// Inserts or updates `job` in `blocks`.
///
/// Non-job blocks come first in their original order, followed by freshly
/// numbered job containers (`jobs-0`, `jobs-1`, ...).
pub fn upsert_job(blocks: &[Block], job: &JobLine) -> Vec<Block> {
    let mut other_blocks = Vec::new();
    let mut elements: Vec<JobElement> = Vec::new();
    for block in blocks {
        match block {
            Block::Jobs(jobs) => elements.extend(jobs.elements.iter().cloned()),
            Block::Other(_) => other_blocks.push(block.clone()),
        }
    }

    let rendered = job.render();
    match elements.iter().position(|el| el.url == rendered.url) {
        None => elements.push(rendered),
        Some(pos) if elements[pos].is_terminal() => {}
        Some(pos) => elements[pos] = rendered,
    }

    other_blocks.extend(chunk_elements(elements));
    other_blocks
}

/// Packs job lines into containers of at most [`JOB_BLOCK_LIMIT`] elements.
pub fn chunk_elements(elements: Vec<JobElement>) -> impl Iterator<Item = Block> {
    let mut chunks = Vec::with_capacity(elements.len().div_ceil(JOB_BLOCK_LIMIT));
    let mut remaining = elements.into_iter().peekable();
    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(JOB_BLOCK_LIMIT).collect::<Vec<_>>());
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, elements)| {
            Block::Jobs(JobsBlock {
                block_id: JobsBlock::block_id_for(index),
                elements,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::blocks::job_elements;
    use crate::status::job::JobState;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn job(n: usize, state: JobState) -> JobLine {
        let terminal = state.is_terminal();
        JobLine {
            name: format!("job-{n}"),
            url: format!("https://github.com/o/r/actions/runs/1/job/{n}"),
            state,
            started_at: Some(at(0)),
            completed_at: terminal.then(|| at(42)),
        }
    }

    fn header() -> Block {
        Block::Other(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": "*CI #1*" }
        }))
    }

    fn job_block_count(blocks: &[Block]) -> usize {
        blocks.iter().filter(|b| b.is_jobs()).count()
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        job_elements(blocks).map(|e| e.text.clone()).collect()
    }

    #[test]
    fn first_job_creates_a_container_after_other_blocks() {
        let out = upsert_job(&[header()], &job(1, JobState::Pending));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], header());
        let jobs = out[1].as_jobs().unwrap();
        assert_eq!(jobs.block_id, "jobs-0");
        assert_eq!(jobs.elements.len(), 1);
        assert!(jobs.elements[0].text.starts_with(":hourglass_flowing_sand:"));
    }

    #[test]
    fn progress_replaces_line_in_place() {
        let blocks = upsert_job(&[header()], &job(1, JobState::Pending));
        let blocks = upsert_job(&blocks, &job(2, JobState::Pending));
        let blocks = upsert_job(&blocks, &job(1, JobState::Running));

        let lines = texts(&blocks);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(":arrows_counterclockwise:"));
        assert!(lines[0].contains("|job-1>"));
        assert!(lines[1].contains("|job-2>"));
    }

    #[test]
    fn completion_adds_elapsed_suffix() {
        let blocks = upsert_job(&[], &job(1, JobState::Running));
        let blocks = upsert_job(&blocks, &job(1, JobState::Failure));
        assert_eq!(
            texts(&blocks),
            vec![":x: <https://github.com/o/r/actions/runs/1/job/1|job-1> (0:42)".to_string()]
        );
    }

    #[test]
    fn terminal_state_is_sticky() {
        let done = upsert_job(&[header()], &job(1, JobState::Success));
        for late in [JobState::Pending, JobState::Running, JobState::Failure] {
            let out = upsert_job(&done, &job(1, late));
            assert_eq!(out, done, "{late:?} overwrote a terminal line");
        }
    }

    #[test]
    fn terminal_update_is_idempotent() {
        let base = upsert_job(&[header()], &job(1, JobState::Running));
        let once = upsert_job(&base, &job(1, JobState::Cancelled));
        let twice = upsert_job(&once, &job(1, JobState::Cancelled));
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn eleven_jobs_make_two_containers() {
        let mut blocks = vec![header()];
        for n in 0..11 {
            blocks = upsert_job(&blocks, &job(n, JobState::Pending));
        }
        assert_eq!(job_block_count(&blocks), 2);
        assert_eq!(blocks[1].as_jobs().unwrap().elements.len(), 10);
        assert_eq!(blocks[2].as_jobs().unwrap().elements.len(), 1);
        assert_eq!(blocks[2].as_jobs().unwrap().block_id, "jobs-1");
    }

    #[test]
    fn interleaved_blocks_are_regrouped() {
        let divider = Block::Other(json!({ "type": "divider" }));
        let a = job(1, JobState::Pending).render();
        let b = job(2, JobState::Pending).render();
        let blocks = vec![
            Block::Jobs(JobsBlock {
                block_id: "jobs-0".into(),
                elements: vec![a],
            }),
            divider.clone(),
            Block::Jobs(JobsBlock {
                block_id: "jobs-1".into(),
                elements: vec![b],
            }),
            header(),
        ];
        let out = upsert_job(&blocks, &job(3, JobState::Pending));

        assert_eq!(out[0], divider);
        assert_eq!(out[1], header());
        assert_eq!(out.len(), 3);
        let urls: Vec<_> = job_elements(&out).map(|e| e.url.clone()).collect();
        assert!(urls[0].ends_with("/job/1"));
        assert!(urls[1].ends_with("/job/2"));
        assert!(urls[2].ends_with("/job/3"));
    }

    #[test]
    fn chunk_of_nothing_is_empty() {
        assert_eq!(chunk_elements(Vec::new()).count(), 0);
    }

    proptest! {
        #[test]
        fn chunking_invariant(n in 1usize..60) {
            let mut blocks = vec![header()];
            for i in 0..n {
                blocks = upsert_job(&blocks, &job(i, JobState::Pending));
            }

            prop_assert_eq!(blocks[0].clone(), header());
            prop_assert_eq!(job_block_count(&blocks), n.div_ceil(JOB_BLOCK_LIMIT));
            for (index, block) in blocks[1..].iter().enumerate() {
                let jobs = block.as_jobs().unwrap();
                prop_assert!(jobs.elements.len() <= JOB_BLOCK_LIMIT);
                prop_assert_eq!(&jobs.block_id, &format!("jobs-{index}"));
            }

            let urls: Vec<String> = job_elements(&blocks).map(|e| e.url.clone()).collect();
            let expected: Vec<String> = (0..n).map(|i| job(i, JobState::Pending).url).collect();
            prop_assert_eq!(urls, expected);
        }

        #[test]
        fn updates_never_regress_terminal_lines(
            updates in prop::collection::vec((0usize..5, 0usize..5), 1..40)
        ) {
            let states = [
                JobState::Pending,
                JobState::Running,
                JobState::Success,
                JobState::Failure,
                JobState::Cancelled,
            ];
            let mut blocks: Vec<Block> = Vec::new();
            let mut first_terminal: [Option<JobState>; 5] = [None; 5];

            for (n, s) in updates {
                let state = states[s];
                blocks = upsert_job(&blocks, &job(n, state));
                if state.is_terminal() && first_terminal[n].is_none() {
                    first_terminal[n] = Some(state);
                }
            }

            for el in job_elements(&blocks) {
                let n: usize = el.url.rsplit('/').next().unwrap().parse().unwrap();
                if let Some(expected) = first_terminal[n] {
                    prop_assert_eq!(el.state(), Some(expected));
                }
            }
        }
    }
}
