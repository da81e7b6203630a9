// Repository binding: clone-if-absent, pull-if-present, committer identity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigurationError, RepoError, SyncFailure};
use crate::git::credentials::TransportCredential;
use crate::git::publisher::PushPolicy;
use crate::git::remote::RemoteLocator;
use crate::git::worker::{CommandExecutor, GitWorker, GitWorkerError, ProcessCommandExecutor};

pub const DEFAULT_REMOTE_NAME: &str = "origin";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMMITTER_NAME: &str = "nobody";
pub const DEFAULT_COMMITTER_EMAIL: &str = "nobody@gmail.com";

/// Name and email recorded on every commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitterIdentity {
    pub name: String,
    pub email: String,
}

impl Default for CommitterIdentity {
    fn default() -> Self {
        Self { name: DEFAULT_COMMITTER_NAME.into(), email: DEFAULT_COMMITTER_EMAIL.into() }
    }
}

impl CommitterIdentity {
    /// Fill omitted fields from the defaults.
    pub fn from_parts(name: Option<String>, email: Option<String>) -> Self {
        let defaults = Self::default();
        Self { name: name.unwrap_or(defaults.name), email: email.unwrap_or(defaults.email) }
    }
}

/// Everything needed to bind one working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// SSH-style remote, `user@host:path`.
    pub remote: String,
    /// Checkout directory; relative paths resolve against the process cwd.
    pub local_path: PathBuf,
    /// Script git runs instead of `ssh`.
    pub credential_path: PathBuf,
    pub committer: CommitterIdentity,
    pub remote_name: String,
    pub branch: String,
    pub push_policy: PushPolicy,
}

impl RepositoryConfig {
    pub fn new(
        remote: impl Into<String>,
        local_path: impl Into<PathBuf>,
        credential_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote: remote.into(),
            local_path: local_path.into(),
            credential_path: credential_path.into(),
            committer: CommitterIdentity::default(),
            remote_name: DEFAULT_REMOTE_NAME.into(),
            branch: DEFAULT_BRANCH.into(),
            push_policy: PushPolicy::Disabled,
        }
    }

    pub fn with_committer(mut self, committer: CommitterIdentity) -> Self {
        self.committer = committer;
        self
    }

    pub fn with_push_policy(mut self, push_policy: PushPolicy) -> Self {
        self.push_policy = push_policy;
        self
    }
}

/// A bound working copy. Owns the directory for the life of the process.
#[derive(Debug)]
pub struct RepositoryHandle<E = ProcessCommandExecutor> {
    remote: RemoteLocator,
    path: PathBuf,
    committer: CommitterIdentity,
    credential: TransportCredential,
    remote_name: String,
    branch: String,
    push_policy: PushPolicy,
    worker: GitWorker<E>,
}

/// Clone or update the working copy described by `config`.
pub fn bind(config: &RepositoryConfig) -> Result<RepositoryHandle, RepoError> {
    bind_with_executor(config, ProcessCommandExecutor)
}

/// Open an existing working copy without touching the network.
pub fn open(config: &RepositoryConfig) -> Result<RepositoryHandle, RepoError> {
    open_with_executor(config, ProcessCommandExecutor)
}

pub fn bind_with_executor<E: CommandExecutor>(
    config: &RepositoryConfig,
    executor: E,
) -> Result<RepositoryHandle<E>, RepoError> {
    let handle = RepositoryHandle::validate(config, executor)?;
    let env = handle.credential.env();

    if is_working_copy(&handle.path) {
        info!(path = %handle.path.display(), branch = %handle.branch, "working copy present, pulling");
        handle
            .worker
            .pull_fast_forward(&handle.remote_name, &handle.branch, &env)
            .map_err(|error| RepoError::sync(&handle.path, error))?;
    } else {
        info!(path = %handle.path.display(), remote = %handle.remote, "cloning working copy");
        let created = !handle.path.exists();
        std::fs::create_dir_all(&handle.path)
            .map_err(|error| RepoError::sync(&handle.path, error))?;

        if let Err(error) = handle.worker.clone_from(&handle.remote.to_string(), &handle.remote_name, &env) {
            if created {
                if let Err(cleanup) = std::fs::remove_dir_all(&handle.path) {
                    warn!(path = %handle.path.display(), error = %cleanup, "failed to remove directory after clone failure");
                }
            }
            return Err(RepoError::sync(&handle.path, error));
        }
    }

    handle.apply_identity().map_err(|error| RepoError::sync(&handle.path, error))?;
    info!(path = %handle.path.display(), "repository bound");
    Ok(handle)
}

pub fn open_with_executor<E: CommandExecutor>(
    config: &RepositoryConfig,
    executor: E,
) -> Result<RepositoryHandle<E>, RepoError> {
    let handle = RepositoryHandle::validate(config, executor)?;
    if !is_working_copy(&handle.path) {
        return Err(RepoError::sync(&handle.path, SyncFailure::NotAWorkingCopy));
    }
    Ok(handle)
}

fn is_working_copy(path: &Path) -> bool {
    path.join(".git").exists()
}

fn resolve_local_path(path: &Path) -> Result<PathBuf, ConfigurationError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|error| ConfigurationError::LocalPath {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;
    Ok(cwd.join(path))
}

impl<E: CommandExecutor> RepositoryHandle<E> {
    /// Check every precondition before any side effect.
    fn validate(config: &RepositoryConfig, executor: E) -> Result<Self, RepoError> {
        let remote = RemoteLocator::parse(&config.remote)?;
        let credential = TransportCredential::provision(&config.credential_path)?;
        let path = resolve_local_path(&config.local_path)?;

        Ok(Self {
            remote,
            worker: GitWorker::with_executor(&path, executor),
            path,
            committer: config.committer.clone(),
            credential,
            remote_name: config.remote_name.clone(),
            branch: config.branch.clone(),
            push_policy: config.push_policy,
        })
    }

    fn apply_identity(&self) -> Result<(), GitWorkerError> {
        self.worker.set_config("user.name", &self.committer.name)?;
        self.worker.set_config("user.email", &self.committer.email)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote(&self) -> &RemoteLocator {
        &self.remote
    }

    pub fn committer(&self) -> &CommitterIdentity {
        &self.committer
    }

    pub fn credential(&self) -> &TransportCredential {
        &self.credential
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn push_policy(&self) -> PushPolicy {
        self.push_policy
    }

    pub(crate) fn worker(&self) -> &GitWorker<E> {
        &self.worker
    }
}
