// CLI subcommand dispatch.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use notesync_daemon::config::NoteSyncConfig;
use notesync_daemon::git::{open, RepositoryHandle};
use tracing::debug;

pub mod bind;
pub mod commit;
pub mod note;
pub mod status;

#[derive(Subcommand)]
pub enum Command {
    /// Clone the notes repository, or pull it if already present
    Bind(bind::BindArgs),
    /// Show untracked and modified files in the working copy
    Status(status::StatusArgs),
    /// Commit every pending change
    Commit(commit::CommitArgs),
    /// Write a text note into the inbox and commit it
    Note(note::NoteArgs),
}

pub fn run(cmd: Command, config_path: Option<&Path>) -> anyhow::Result<()> {
    match cmd {
        Command::Bind(args) => bind::run(args, config_path),
        Command::Status(args) => status::run(args, config_path),
        Command::Commit(args) => commit::run(args, config_path),
        Command::Note(args) => note::run(args, config_path),
    }
}

pub(crate) fn load_config(config_path: Option<&Path>) -> anyhow::Result<NoteSyncConfig> {
    debug!(config = ?config_path, "loading configuration");
    NoteSyncConfig::load(config_path).context("failed to load configuration")
}

/// Open the configured working copy without network access.
pub(crate) fn open_repository(config: &NoteSyncConfig) -> anyhow::Result<RepositoryHandle> {
    let repo_config = config.repository_config().context("incomplete repository configuration")?;
    debug!(path = %repo_config.local_path.display(), "opening working copy");
    open(&repo_config)
        .with_context(|| format!("failed to open repository at {}", repo_config.local_path.display()))
}
