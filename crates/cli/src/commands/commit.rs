// `notesync commit` — commit every pending change in the working copy.

use std::path::Path;

use clap::Args;
use notesync_daemon::config::NoteSyncConfig;
use notesync_daemon::git::publisher::DEFAULT_COMMIT_MESSAGE;
use notesync_daemon::git::{CommitOutcome, CommitRequest};
use serde::Serialize;

use crate::exit_code::UsageError;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct CommitArgs {
    /// Commit message.
    #[arg(long, short)]
    message: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitResult {
    pub path: String,
    #[serde(flatten)]
    pub outcome: CommitOutcome,
}

pub fn run(args: CommitArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = resolve_commit_message(args.message).and_then(|message| {
        let config = super::load_config(config_path)?;
        execute(&config, message)
    });

    match result {
        Ok(result) => {
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn resolve_commit_message(message: Option<String>) -> anyhow::Result<String> {
    match message {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(UsageError::new("--message must not be empty").into());
            }
            Ok(trimmed.to_string())
        }
        None => Ok(DEFAULT_COMMIT_MESSAGE.to_string()),
    }
}

fn execute(config: &NoteSyncConfig, message: String) -> anyhow::Result<CommitResult> {
    let handle = super::open_repository(config)?;
    let request = CommitRequest { branch: handle.branch().to_string(), message };
    let outcome = handle.commit(&request)?;
    Ok(CommitResult { path: handle.path().display().to_string(), outcome })
}

fn format_human(result: &CommitResult) -> String {
    let outcome = &result.outcome;
    if !outcome.committed {
        return "Nothing to commit.".to_string();
    }

    let id = outcome.commit_id.as_deref().unwrap_or("unknown");
    let short = id.get(..12).unwrap_or(id);
    let mut line = format!("Committed {} file(s) as {short}", outcome.paths.len());
    if outcome.pushed {
        line.push_str(" and pushed");
    }
    line
}
