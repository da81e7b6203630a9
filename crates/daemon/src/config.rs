// Configuration for the bot back end.
//
// Global config: `~/.notesync/config.toml` (or an explicit path).
// Environment variables override file values; see `ENV_*` below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use notesync_common::inbox::DEFAULT_INBOX_DIR;

use crate::git::binding::{CommitterIdentity, RepositoryConfig, DEFAULT_BRANCH, DEFAULT_REMOTE_NAME};
use crate::git::publisher::PushPolicy;

pub const ENV_CONFIG: &str = "NOTESYNC_CONFIG";
pub const ENV_REMOTE: &str = "NOTESYNC_REMOTE";
pub const ENV_SSH_PATH: &str = "NOTESYNC_SSH_PATH";
pub const ENV_GIT_NAME: &str = "NOTESYNC_GIT_NAME";
pub const ENV_GIT_EMAIL: &str = "NOTESYNC_GIT_EMAIL";
pub const ENV_REPO_PATH: &str = "NOTESYNC_REPO_PATH";
pub const ENV_AUTHORIZED_SENDER: &str = "NOTESYNC_AUTHORIZED_SENDER";
pub const ENV_PUSH: &str = "NOTESYNC_PUSH";

/// Default checkout directory, relative to the process working directory.
pub const DEFAULT_REPO_PATH: &str = "notes";

/// Root directory for notesync global state: `~/.notesync/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".notesync"))
}

/// Path to the global config file: `~/.notesync/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NoteSyncConfig {
    pub repository: RepositorySection,
    pub git: GitSection,
    pub inbox: InboxSection,
}

/// Where the working copy comes from and who commits into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositorySection {
    /// SSH-style remote, e.g. `git@github.com:account/notes.git`.
    pub remote: Option<String>,
    /// Checkout directory.
    pub path: PathBuf,
    /// Script git runs instead of `ssh`.
    pub credential: Option<PathBuf>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            remote: None,
            path: PathBuf::from(DEFAULT_REPO_PATH),
            credential: None,
            committer_name: None,
            committer_email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitSection {
    /// Remote name (defaults to `"origin"`).
    pub remote_name: String,
    /// The single branch pulled and committed to (defaults to `"main"`).
    pub branch: String,
    pub push_policy: PushPolicy,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            remote_name: DEFAULT_REMOTE_NAME.into(),
            branch: DEFAULT_BRANCH.into(),
            push_policy: PushPolicy::Disabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InboxSection {
    /// Folder for new notes, relative to the working copy.
    pub folder: String,
    /// Only this sender may add notes. Unset accepts everyone.
    pub authorized_sender: Option<String>,
}

impl Default for InboxSection {
    fn default() -> Self {
        Self { folder: DEFAULT_INBOX_DIR.into(), authorized_sender: None }
    }
}

impl NoteSyncConfig {
    /// Load `explicit` (must exist), else the global file when present,
    /// else defaults; then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match global_config_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Apply `NOTESYNC_*` overrides read through `lookup`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(remote) = get(ENV_REMOTE) {
            self.repository.remote = Some(remote);
        }
        if let Some(path) = get(ENV_SSH_PATH) {
            self.repository.credential = Some(PathBuf::from(path));
        }
        if let Some(name) = get(ENV_GIT_NAME) {
            self.repository.committer_name = Some(name);
        }
        if let Some(email) = get(ENV_GIT_EMAIL) {
            self.repository.committer_email = Some(email);
        }
        if let Some(path) = get(ENV_REPO_PATH) {
            self.repository.path = PathBuf::from(path);
        }
        if let Some(sender) = get(ENV_AUTHORIZED_SENDER) {
            self.inbox.authorized_sender = Some(sender);
        }
        if let Some(push) = get(ENV_PUSH) {
            self.git.push_policy = match push.trim().to_ascii_lowercase().as_str() {
                "enabled" | "true" | "1" => PushPolicy::Enabled,
                "disabled" | "false" | "0" => PushPolicy::Disabled,
                _ => return Err(ConfigError::InvalidValue { key: ENV_PUSH, value: push }),
            };
        }
        Ok(())
    }

    /// Binding parameters; fails when the remote or credential is unset.
    pub fn repository_config(&self) -> Result<RepositoryConfig, ConfigError> {
        let remote = self
            .repository
            .remote
            .clone()
            .ok_or(ConfigError::Missing { field: "repository.remote", env: ENV_REMOTE })?;
        let credential = self
            .repository
            .credential
            .clone()
            .ok_or(ConfigError::Missing { field: "repository.credential", env: ENV_SSH_PATH })?;

        let mut config = RepositoryConfig::new(remote, self.repository.path.clone(), credential)
            .with_committer(CommitterIdentity::from_parts(
                self.repository.committer_name.clone(),
                self.repository.committer_email.clone(),
            ))
            .with_push_policy(self.git.push_policy);
        config.remote_name = self.git.remote_name.clone();
        config.branch = self.git.branch.clone();
        Ok(config)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Missing { field: &'static str, env: &'static str },
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Serialize(e) => write!(f, "config serialize error: {e}"),
            Self::Missing { field, env } => {
                write!(f, "missing configuration: set `{field}` in the config file or `{env}`")
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
        }
    }
}

impl std::error::Error for ConfigError {}
