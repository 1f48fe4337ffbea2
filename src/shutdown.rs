//! Cancellation sources for a CLI run: OS signals and the optional run
//! deadline. Both cancel the same token the scenario runner watches.
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Cancels `token` on Ctrl+C (and SIGTERM on unix). Exits quietly once the
/// token is cancelled by anyone else.
pub fn setup_signal_shutdown_handler(token: &CancellationToken) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = token.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    on_ctrl_c(&token, result).await;
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("Received SIGTERM, stopping run");
                    token.cancel();
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = token.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    on_ctrl_c(&token, result).await;
                }
            }
        }
    })
}

async fn on_ctrl_c(token: &CancellationToken, result: std::io::Result<()>) {
    match result {
        Ok(()) => {
            info!("Received Ctrl+C, stopping run");
            token.cancel();
        }
        Err(err) => {
            warn!("Failed to listen for Ctrl+C: {}", err);
            token.cancelled().await;
        }
    }
}

/// Cancels `token` once `duration` has elapsed.
pub fn setup_deadline(token: &CancellationToken, duration: Duration) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(duration) => {
                info!("Run duration of {:?} elapsed", duration);
                token.cancel();
            }
        }
    })
}
