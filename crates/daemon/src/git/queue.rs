// Single-writer commit queue.
//
// One blocking worker owns the `RepositoryHandle` and runs jobs strictly in
// submission order: write the inbox files, then commit. Nothing else touches
// the working copy or its index while the queue is alive.

use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::error::{RepoError, RepoErrorKind};
use crate::git::binding::RepositoryHandle;
use crate::git::publisher::{CommitOutcome, CommitRequest};
use crate::git::worker::CommandExecutor;
use crate::inbox::{InboxWriter, NotePayload};

/// Jobs buffered before `submit` starts waiting.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteJob {
    pub id: Uuid,
    pub payload: NotePayload,
    pub received_at: NaiveDateTime,
    pub message: String,
}

impl NoteJob {
    pub fn new(payload: NotePayload, received_at: NaiveDateTime, message: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), payload, received_at, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: Uuid,
    /// Files created by the job, relative to the working copy.
    pub written: Vec<String>,
    pub commit: CommitOutcome,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("commit queue is closed")]
    Closed,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

struct QueuedJob {
    job: NoteJob,
    reply: oneshot::Sender<Result<JobOutcome, RepoError>>,
}

/// Cloneable sender side of the queue.
#[derive(Debug, Clone)]
pub struct CommitQueue {
    tx: mpsc::Sender<QueuedJob>,
}

impl std::fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedJob").field("job_id", &self.job.id).finish()
    }
}

impl CommitQueue {
    /// Spawn the worker. It stops once every `CommitQueue` clone is dropped
    /// and the buffered jobs are drained; await the returned handle to wait
    /// for that.
    pub fn start<E>(handle: RepositoryHandle<E>, writer: InboxWriter, capacity: usize) -> (Self, JoinHandle<()>)
    where
        E: CommandExecutor + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<QueuedJob>(capacity.max(1));

        let task = tokio::task::spawn_blocking(move || {
            while let Some(QueuedJob { job, reply }) = rx.blocking_recv() {
                let span = info_span!("note_job", job_id = %job.id);
                let _entered = span.enter();

                let result = run_job(&handle, &writer, &job);
                if let Err(error) = &result {
                    warn!(%error, "note job failed");
                }
                if reply.send(result).is_err() {
                    warn!("submitter dropped before the job finished");
                }
            }
            info!(path = %handle.path().display(), "commit queue closed");
        });

        (Self { tx }, task)
    }

    /// Enqueue `job` and wait for its outcome.
    pub async fn submit(&self, job: NoteJob) -> Result<JobOutcome, SubmitError> {
        let (reply, response) = oneshot::channel();
        self.tx.send(QueuedJob { job, reply }).await.map_err(|_| SubmitError::Closed)?;
        let result = response.await.map_err(|_| SubmitError::Closed)?;
        Ok(result?)
    }
}

fn run_job<E: CommandExecutor>(
    handle: &RepositoryHandle<E>,
    writer: &InboxWriter,
    job: &NoteJob,
) -> Result<JobOutcome, RepoError> {
    let written = writer
        .write(&job.payload, job.received_at)
        .map_err(|error| RepoError::commit(handle.path(), error))?;
    let request = CommitRequest { branch: handle.branch().to_string(), message: job.message.clone() };
    let commit = match handle.commit(&request) {
        Ok(commit) => commit,
        Err(error) => {
            // A failed push leaves the local commit in place; only an
            // uncommitted note is taken back out of the inbox.
            if error.kind() == RepoErrorKind::Commit {
                writer.discard(&written);
            }
            return Err(error);
        }
    };
    info!(files = ?written, committed = commit.committed, "note job done");
    Ok(JobOutcome { job_id: job.id, written, commit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::binding::{open_with_executor, RepositoryConfig};
    use crate::git::worker::tests::{failed, ok, MockExecutor};
    use chrono::NaiveDate;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn minute() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn start(
        dir: &TempDir,
        responses: Vec<Result<crate::git::worker::CommandResult, std::io::Error>>,
    ) -> (CommitQueue, JoinHandle<()>, MockExecutor) {
        let script = dir.path().join("ssh.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        let local = dir.path().join("notes");
        std::fs::create_dir_all(local.join(".git")).unwrap();
        let config = RepositoryConfig::new("git@example.com:user/notes.git", &local, script);
        let mock = MockExecutor::new(responses);
        let handle = open_with_executor(&config, mock.clone()).unwrap();
        let writer = InboxWriter::new(&local, "Inbox").unwrap();
        let (queue, task) = CommitQueue::start(handle, writer, 4);
        (queue, task, mock)
    }

    fn commit_responses(status: &str, head: &str) -> Vec<Result<crate::git::worker::CommandResult, std::io::Error>> {
        vec![ok(status), ok(""), ok(""), ok(head)]
    }

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let mut responses = commit_responses("?? Inbox/202401010000_from_bot.md\0", "c1\n");
        responses.extend(commit_responses("?? Inbox/202401010000_from_bot-2.md\0", "c2\n"));
        let (queue, task, mock) = start(&dir, responses);

        let first = queue
            .submit(NoteJob::new(NotePayload::Text("one".into()), minute(), "first"))
            .await
            .expect("first job should succeed");
        let second = queue
            .submit(NoteJob::new(NotePayload::Text("two".into()), minute(), "second"))
            .await
            .expect("second job should succeed");

        assert_eq!(first.written, vec!["Inbox/202401010000_from_bot.md"]);
        assert_eq!(first.commit.commit_id.as_deref(), Some("c1"));
        assert_eq!(second.written, vec!["Inbox/202401010000_from_bot-2.md"]);
        assert_eq!(second.commit.commit_id.as_deref(), Some("c2"));

        let messages: Vec<OsString> = mock
            .calls()
            .into_iter()
            .filter(|call| call.args[0] == "commit")
            .map(|call| call.args[3].clone())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);

        drop(queue);
        task.await.expect("worker should stop once the queue is dropped");
    }

    #[tokio::test]
    async fn concurrent_submitters_never_interleave() {
        let dir = TempDir::new().unwrap();
        let mut responses = Vec::new();
        for n in 0..8 {
            responses.extend(commit_responses("?? x.md\0", &format!("c{n}\n")));
        }
        let (queue, task, mock) = start(&dir, responses);

        let mut submitters = Vec::new();
        for n in 0..8 {
            let queue = queue.clone();
            submitters.push(tokio::spawn(async move {
                queue.submit(NoteJob::new(NotePayload::Text(format!("note {n}")), minute(), format!("m{n}"))).await
            }));
        }
        for submitter in submitters {
            submitter.await.unwrap().expect("job should succeed");
        }

        let verbs: Vec<OsString> = mock.calls().into_iter().map(|call| call.args[0].clone()).collect();
        for chunk in verbs.chunks(4) {
            assert_eq!(chunk, ["status", "add", "commit", "rev-parse"]);
        }
        drop(queue);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn failed_job_does_not_stop_the_queue() {
        let dir = TempDir::new().unwrap();
        let mut responses = vec![ok("?? a.md\0"), failed(128, "fatal: index.lock exists")];
        responses.extend(commit_responses("?? a.md\0", "c2\n"));
        let (queue, task, _mock) = start(&dir, responses);
        let note = dir.path().join("notes/Inbox/202401010000_from_bot.md");

        let error = queue
            .submit(NoteJob::new(NotePayload::Text("one".into()), minute(), "first"))
            .await
            .expect_err("first job should fail");
        match error {
            SubmitError::Repo(repo) => assert_eq!(repo.kind(), RepoErrorKind::Commit),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!note.exists(), "uncommitted note should be removed");

        let outcome = queue
            .submit(NoteJob::new(NotePayload::Text("two".into()), minute(), "second"))
            .await
            .expect("second job should succeed");
        assert!(outcome.commit.committed);
        assert_eq!(outcome.written, vec!["Inbox/202401010000_from_bot.md"]);
        assert_eq!(std::fs::read_to_string(&note).unwrap(), "two");

        drop(queue);
        task.await.unwrap();
    }
}
