// Transport credential for network git operations.
//
// The credential is a script git runs in place of `ssh` (via `GIT_SSH`). It
// is carried explicitly and applied per call to clone, pull and push; the
// process environment is never modified.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ConfigurationError;

/// Environment variable git consults for the ssh program.
pub const GIT_SSH_ENV: &str = "GIT_SSH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCredential {
    ssh_program: PathBuf,
}

impl TransportCredential {
    /// Validate `path` and wrap it as a credential.
    ///
    /// Fails with `MissingCredential` unless `path` is an existing file. A
    /// file without any executable bit is accepted with a warning.
    pub fn provision(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|_| ConfigurationError::MissingCredential { path: path.to_path_buf() })?;
        if !metadata.is_file() {
            return Err(ConfigurationError::MissingCredential { path: path.to_path_buf() });
        }
        if !is_executable(&metadata) {
            warn!(path = %path.display(), "credential script is not executable; git will fail to run it");
        }

        // git resolves GIT_SSH relative to the command's cwd, so pin it.
        let ssh_program = std::path::absolute(path).map_err(|error| ConfigurationError::LocalPath {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Ok(Self { ssh_program })
    }

    pub fn ssh_program(&self) -> &Path {
        &self.ssh_program
    }

    /// Environment to pass to a network git call.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![(GIT_SSH_ENV.to_string(), self.ssh_program.to_string_lossy().into_owned())]
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}
