// Change detection: untracked and modified paths relative to the last commit.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::error::RepoError;
use crate::git::binding::RepositoryHandle;
use crate::git::worker::CommandExecutor;

/// Paths that differ from `HEAD` at the instant of inspection.
///
/// Derived on demand and never cached; untracked paths come first, then
/// modified/deleted/staged ones, each in git's output order. Paths keep
/// their on-disk bytes, so they can be handed back to git unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    #[serde(serialize_with = "serialize_paths")]
    pub untracked: Vec<PathBuf>,
    #[serde(serialize_with = "serialize_paths")]
    pub modified: Vec<PathBuf>,
}

impl ChangeSet {
    /// Parse `git status --porcelain -z` output.
    pub fn from_porcelain(output: &[u8]) -> Self {
        let mut changes = Self::default();
        let mut entries = output.split(|byte| *byte == 0).filter(|entry| !entry.is_empty());

        while let Some(entry) = entries.next() {
            if entry.len() < 4 || entry[2] != b' ' {
                continue;
            }
            let (x, y) = (entry[0], entry[1]);
            let path = path_from_bytes(&entry[3..]);

            match (x, y) {
                (b'?', b'?') => changes.untracked.push(path),
                (b'!', b'!') => {}
                _ => {
                    changes.modified.push(path);
                    // Rename/copy entries carry the source path as the next field.
                    if matches!(x, b'R' | b'C') {
                        entries.next();
                    }
                }
            }
        }

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.untracked.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.untracked.len() + self.modified.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.untracked.iter().chain(self.modified.iter()).map(PathBuf::as_path)
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Paths render lossily in JSON; undecodable bytes become U+FFFD.
pub(crate) fn serialize_paths<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|path| path.to_string_lossy()))
}

impl<E: CommandExecutor> RepositoryHandle<E> {
    /// Read-only inspection of the working copy.
    pub fn detect_changes(&self) -> Result<ChangeSet, RepoError> {
        let output = self.worker().status_porcelain().map_err(|error| RepoError::commit(self.path(), error))?;
        Ok(ChangeSet::from_porcelain(&output.stdout))
    }
}

/// Free-function form of [`RepositoryHandle::detect_changes`].
pub fn detect_changes<E: CommandExecutor>(handle: &RepositoryHandle<E>) -> Result<ChangeSet, RepoError> {
    handle.detect_changes()
}
