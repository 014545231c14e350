//! Console channel: reads lines from stdin as one user, hands each to the
//! aggregator and prints the reply.
//!
//! Runs until the `shutdown` token is cancelled (Ctrl-C) or input closes.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::launch::aggregator::Aggregator;
use crate::launch::status::render_outcome;
use crate::ledger::Network;

const BANNER: &str = "─────────────────────────────────────\n Burst token launcher  (Ctrl-C to quit)\n─────────────────────────────────────\n";

const HINT: &str = "Tell me you want to create a token to get started, or \"cancel\" to clear a draft.";

/// Drive the console on stdin/stdout.
pub async fn run(
    aggregator: Arc<Aggregator>,
    user_id: &str,
    network: Network,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    run_with(&aggregator, user_id, network, shutdown, input, output).await
}

/// Console loop over any line source and sink.
pub async fn run_with<R, W>(
    aggregator: &Aggregator,
    user_id: &str,
    network: Network,
    shutdown: CancellationToken,
    input: R,
    mut output: W,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(%user_id, %network, "console started");
    output.write_all(BANNER.as_bytes()).await?;

    let mut lines = input.lines();

    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                output.write_all(b"\nshutting down\n").await?;
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("console input closed");
                        break;
                    }
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        debug!(input = %text, "console received line");

                        let outcome = aggregator.handle_turn(user_id, text).await;
                        let reply = render_outcome(&outcome, network).unwrap_or_else(|| HINT.to_string());
                        output.write_all(reply.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                    }
                }
            }
        }
    }

    output.flush().await?;
    Ok(())
}
