//! Shutdown coordination.
//!
//! Shutdown is cooperative: cancelling the token makes every waiting or
//! future rate-limited request fail with [`Error::ShuttingDown`]. Payload
//! transfers in progress are abandoned the same way. Items in flight settle
//! as failures and no new collection starts. Payloads are written to a
//! `.part` file and renamed; an interrupted write removes the partial file
//! and is never recorded in the ledger.
//!
//! [`Error::ShuttingDown`]: crate::Error::ShuttingDown

use tokio_util::sync::CancellationToken;

use super::Downloader;

impl Downloader {
    /// Request a graceful shutdown
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Initiating graceful shutdown");
        }
        self.cancel.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token cancelled when shutdown is requested
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then shut `downloader` down
///
/// # Example
///
/// ```no_run
/// use pool_dl::{Config, Downloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = Downloader::new(Config::default()).await?;
///     tokio::spawn(run_with_shutdown(downloader.clone()));
///     downloader.update_all().await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: Downloader) {
    wait_for_signal().await;
    downloader.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Handlers may fail to register in restricted environments
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            } else {
                tracing::info!("Received Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
