// `notesync bind` — clone or fast-forward the configured working copy.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use notesync_daemon::config::NoteSyncConfig;
use notesync_daemon::git::{bind, PushPolicy};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct BindArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindResult {
    pub path: String,
    pub remote: String,
    pub branch: String,
    pub push_policy: PushPolicy,
}

pub fn run(args: BindArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
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

fn execute(config: &NoteSyncConfig) -> anyhow::Result<BindResult> {
    let repo_config = config.repository_config().context("incomplete repository configuration")?;
    let handle = bind(&repo_config)
        .with_context(|| format!("failed to bind repository at {}", repo_config.local_path.display()))?;

    Ok(BindResult {
        path: handle.path().display().to_string(),
        remote: handle.remote().to_string(),
        branch: handle.branch().to_string(),
        push_policy: handle.push_policy(),
    })
}

fn format_human(result: &BindResult) -> String {
    let push = match result.push_policy {
        PushPolicy::Disabled => "push disabled",
        PushPolicy::Enabled => "push enabled",
    };
    format!("Bound {} to {} ({}, {push})", result.path, result.remote, result.branch)
}
