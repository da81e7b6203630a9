// `notesync status` — list pending changes in the working copy.

use std::path::Path;

use clap::Args;
use notesync_daemon::config::NoteSyncConfig;
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    pub path: String,
    pub branch: String,
    pub untracked: Vec<String>,
    pub modified: Vec<String>,
}

pub fn run(args: StatusArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::load_config(config_path).and_then(|config| execute(&config));

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

fn execute(config: &NoteSyncConfig) -> anyhow::Result<StatusResult> {
    let handle = super::open_repository(config)?;
    let changes = handle.detect_changes()?;

    Ok(StatusResult {
        path: handle.path().display().to_string(),
        branch: handle.branch().to_string(),
        untracked: changes.untracked.iter().map(|path| path.to_string_lossy().into_owned()).collect(),
        modified: changes.modified.iter().map(|path| path.to_string_lossy().into_owned()).collect(),
    })
}

fn format_human(result: &StatusResult) -> String {
    let mut lines = vec![format!("On branch {} in {}", result.branch, result.path)];

    if result.untracked.is_empty() && result.modified.is_empty() {
        lines.push("Nothing to commit.".to_string());
        return lines.join("\n");
    }
    if !result.untracked.is_empty() {
        lines.push("Untracked:".to_string());
        lines.extend(result.untracked.iter().map(|path| format!("  {path}")));
    }
    if !result.modified.is_empty() {
        lines.push("Modified:".to_string());
        lines.extend(result.modified.iter().map(|path| format!("  {path}")));
    }
    lines.join("\n")
}
