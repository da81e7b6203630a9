// notesync CLI entry point.

use std::path::PathBuf;

use clap::Parser;
use notesync_daemon::config::ENV_CONFIG;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "notesync", about = "Keep a chat-notes inbox in a git repository")]
struct Cli {
    /// Config file (defaults to $NOTESYNC_CONFIG, then ~/.notesync/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

    match commands::run(cli.command, config_path.as_deref()) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => ExitCode::from_error(&error).into(),
    }
}
