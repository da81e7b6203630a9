// `notesync note` — drop a text note into the inbox and commit it.
//
// Writes straight to the working copy; do not run it against a checkout
// that a live `notesyncd` is serving.

use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::Args;
use notesync_daemon::config::NoteSyncConfig;
use notesync_daemon::error::RepoErrorKind;
use notesync_daemon::git::{CommitOutcome, CommitRequest};
use notesync_daemon::inbox::{InboxWriter, NotePayload};
use notesync_daemon::intake::NOTE_COMMIT_MESSAGE;
use serde::Serialize;

use crate::exit_code::UsageError;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NoteArgs {
    /// Note text; multiple words are joined with spaces.
    #[arg(required = true, trailing_var_arg = true)]
    text: Vec<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteResult {
    pub written: Vec<String>,
    pub commit: CommitOutcome,
}

pub fn run(args: NoteArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = resolve_note_text(&args.text).and_then(|text| {
        let config = super::load_config(config_path)?;
        execute(&config, text, Local::now().naive_local())
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

fn resolve_note_text(words: &[String]) -> anyhow::Result<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(UsageError::new("note text must not be empty").into());
    }
    Ok(text)
}

fn execute(config: &NoteSyncConfig, text: String, received_at: NaiveDateTime) -> anyhow::Result<NoteResult> {
    let handle = super::open_repository(config)?;
    let writer = InboxWriter::new(handle.path(), &config.inbox.folder)
        .with_context(|| format!("invalid inbox folder `{}`", config.inbox.folder))?;

    let written = writer
        .write(&NotePayload::Text(text), received_at)
        .with_context(|| format!("failed to write note into {}", writer.folder_path().display()))?;
    let request = CommitRequest { branch: handle.branch().to_string(), message: NOTE_COMMIT_MESSAGE.to_string() };
    let commit = handle.commit(&request).inspect_err(|error| {
        if error.kind() == RepoErrorKind::Commit {
            writer.discard(&written);
        }
    })?;

    Ok(NoteResult { written, commit })
}

fn format_human(result: &NoteResult) -> String {
    let files = result.written.join(", ");
    if result.commit.committed {
        format!("Note created: {files}")
    } else {
        format!("Note written but nothing was committed: {files}")
    }
}
