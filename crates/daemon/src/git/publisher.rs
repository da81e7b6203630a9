// Commit publisher: stage detected changes and commit them, optionally push.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CommitFailure, RepoError};
use crate::git::binding::{RepositoryHandle, DEFAULT_BRANCH};
use crate::git::changes::serialize_paths;
use crate::git::worker::CommandExecutor;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Auto commit";

/// Whether a successful commit is pushed to the remote.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PushPolicy {
    /// Commits stay local.
    #[default]
    Disabled,
    /// `git push <remote> <branch>` after every commit.
    Enabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub branch: String,
    pub message: String,
}

impl Default for CommitRequest {
    fn default() -> Self {
        Self { branch: DEFAULT_BRANCH.into(), message: DEFAULT_COMMIT_MESSAGE.into() }
    }
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub committed: bool,
    /// Paths staged into the commit, untracked first.
    #[serde(serialize_with = "serialize_paths")]
    pub paths: Vec<PathBuf>,
    pub commit_id: Option<String>,
    pub pushed: bool,
}

impl<E: CommandExecutor> RepositoryHandle<E> {
    /// Stage every changed path and commit with `request.message`, stored verbatim.
    ///
    /// Returns `committed = false` without touching the index when nothing
    /// changed. Not safe to call concurrently on the same working copy; see
    /// [`crate::git::queue::CommitQueue`].
    pub fn commit(&self, request: &CommitRequest) -> Result<CommitOutcome, RepoError> {
        if request.message.trim().is_empty() {
            return Err(RepoError::commit(self.path(), CommitFailure::EmptyMessage));
        }
        if request.branch != self.branch() {
            warn!(
                requested = %request.branch,
                bound = %self.branch(),
                "ignoring requested branch; handle is bound to a single branch"
            );
        }

        let changes = self.detect_changes()?;
        if changes.is_empty() {
            debug!(path = %self.path().display(), "nothing to commit");
            return Ok(CommitOutcome::default());
        }

        let paths: Vec<PathBuf> = changes.paths().map(Path::to_path_buf).collect();
        for path in &paths {
            debug!(path = %path.display(), "staging");
        }

        let worker = self.worker();
        worker.add(&paths).map_err(|error| RepoError::commit(self.path(), error))?;
        worker.commit(&request.message).map_err(|error| RepoError::commit(self.path(), error))?;
        let commit_id = worker.head_commit().map_err(|error| RepoError::commit(self.path(), error))?;
        info!(commit = %commit_id, files = paths.len(), "committed");

        let pushed = match self.push_policy() {
            PushPolicy::Disabled => false,
            PushPolicy::Enabled => {
                worker
                    .push(self.remote_name(), self.branch(), &self.credential().env())
                    .map_err(|error| RepoError::sync(self.path(), error))?;
                info!(remote = %self.remote_name(), branch = %self.branch(), "pushed");
                true
            }
        };

        Ok(CommitOutcome { committed: true, paths, commit_id: Some(commit_id), pushed })
    }
}

/// Free-function form of [`RepositoryHandle::commit`].
pub fn commit<E: CommandExecutor>(
    handle: &RepositoryHandle<E>,
    request: &CommitRequest,
) -> Result<CommitOutcome, RepoError> {
    handle.commit(request)
}
