// notesyncd: JSON lines on stdin/stdout, logs on stderr.

use std::path::PathBuf;

use anyhow::Context;
use notesync_daemon::config::{NoteSyncConfig, ENV_CONFIG};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let explicit = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
    let config = NoteSyncConfig::load(explicit.as_deref()).context("failed to load configuration")?;

    info!("starting notesync daemon");
    notesync_daemon::runtime::run_standalone(config)
        .await
        .context("notesync daemon terminated unexpectedly")
}
