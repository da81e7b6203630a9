use anyhow::{Context, Result};
use notesync_common::types::{Acknowledgment, InboundMessage};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::NoteSyncConfig;
use crate::git::binding::bind;
use crate::git::queue::{CommitQueue, DEFAULT_QUEUE_CAPACITY};
use crate::inbox::InboxWriter;
use crate::intake::Intake;

/// Serve messages from stdin until EOF or Ctrl-C.
pub async fn run_standalone(config: NoteSyncConfig) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    run_with_io(&config, tokio::io::stdin(), tokio::io::stdout(), shutdown_rx).await
}

/// Bind the repository, then answer one JSON `InboundMessage` per input line
/// with one JSON `Acknowledgment` line. Malformed lines are logged and skipped.
pub async fn run_with_io<R, W>(
    config: &NoteSyncConfig,
    input: R,
    mut output: W,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let repo_config = config.repository_config().context("incomplete repository configuration")?;
    let local_path = repo_config.local_path.clone();
    let handle = tokio::task::spawn_blocking(move || bind(&repo_config))
        .await
        .context("repository bind task panicked")?
        .with_context(|| format!("failed to bind repository at {}", local_path.display()))?;

    let writer = InboxWriter::new(handle.path(), &config.inbox.folder)
        .with_context(|| format!("invalid inbox folder `{}`", config.inbox.folder))?;
    info!(
        path = %handle.path().display(),
        inbox = %writer.folder(),
        push = ?handle.push_policy(),
        "notesync daemon ready"
    );

    let (queue, worker) = CommitQueue::start(handle, writer, DEFAULT_QUEUE_CAPACITY);
    let intake = Intake::new(queue, config.inbox.authorized_sender.clone());

    let mut lines = BufReader::new(input).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.recv() => {
                info!("shutdown requested");
                break;
            }
            line = lines.next_line() => line.context("failed to read inbound message")?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<InboundMessage>(&line) {
            Ok(message) => {
                let ack = intake.handle(message).await;
                write_ack(&mut output, &ack).await?;
            }
            Err(error) => warn!(%error, "skipping malformed inbound message"),
        }
    }

    drop(intake);
    worker.await.context("commit worker panicked")?;
    info!("notesync daemon stopped");
    Ok(())
}

async fn write_ack<W: AsyncWrite + Unpin>(output: &mut W, ack: &Acknowledgment) -> Result<()> {
    let mut encoded = serde_json::to_vec(ack).context("failed to encode acknowledgment")?;
    encoded.push(b'\n');
    output.write_all(&encoded).await.context("failed to write acknowledgment")?;
    output.flush().await.context("failed to flush acknowledgment")
}
