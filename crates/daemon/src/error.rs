// Error taxonomy for repository binding and publishing.

use std::path::PathBuf;

use thiserror::Error;

use crate::git::worker::GitWorkerError;

/// Problems with the local configuration of a binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "missing credential script `{}`: provide an executable that runs ssh with the deploy key, \
         e.g. `ssh -i <key> -oIdentitiesOnly=yes \"$@\"`",
        .path.display()
    )]
    MissingCredential { path: PathBuf },

    #[error("cannot resolve local path `{}`: {message}", .path.display())]
    LocalPath { path: PathBuf, message: String },
}

/// Everything that can go wrong while binding or committing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(
        "invalid remote `{locator}`: expected the SSH form `user@host:path`, \
         e.g. `git@github.com:account/repository.git`"
    )]
    InvalidRemote { locator: String },

    #[error("failed to synchronize `{}` with its remote: {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: SyncFailure,
    },

    #[error("failed to commit in `{}`: {source}", .path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: CommitFailure,
    },
}

impl RepoError {
    pub fn kind(&self) -> RepoErrorKind {
        match self {
            RepoError::Configuration(_) => RepoErrorKind::Configuration,
            RepoError::InvalidRemote { .. } => RepoErrorKind::InvalidRemote,
            RepoError::Sync { .. } => RepoErrorKind::Sync,
            RepoError::Commit { .. } => RepoErrorKind::Commit,
        }
    }

    pub(crate) fn sync(path: impl Into<PathBuf>, source: impl Into<SyncFailure>) -> Self {
        RepoError::Sync { path: path.into(), source: source.into() }
    }

    pub(crate) fn commit(path: impl Into<PathBuf>, source: impl Into<CommitFailure>) -> Self {
        RepoError::Commit { path: path.into(), source: source.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoErrorKind {
    Configuration,
    InvalidRemote,
    Sync,
    Commit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncFailure {
    #[error(transparent)]
    Git(#[from] GitWorkerError),

    #[error("no working copy at this path")]
    NotAWorkingCopy,

    #[error("filesystem error: {0}")]
    Io(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitFailure {
    #[error(transparent)]
    Git(#[from] GitWorkerError),

    #[error("commit message must not be empty")]
    EmptyMessage,

    #[error("cannot write note: {0}")]
    Io(String),

    #[error("rejected note path: {0}")]
    Path(#[from] notesync_common::path::PathError),
}

impl From<std::io::Error> for SyncFailure {
    fn from(error: std::io::Error) -> Self {
        SyncFailure::Io(error.to_string())
    }
}

impl From<std::io::Error> for CommitFailure {
    fn from(error: std::io::Error) -> Self {
        CommitFailure::Io(error.to_string())
    }
}
