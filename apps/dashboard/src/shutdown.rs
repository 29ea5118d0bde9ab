use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The health poller and the HTTP server both watch it.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                    _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Unix signal handlers unavailable, waiting for Ctrl-C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Ctrl-C handler failed, shutting down");
                } else {
                    info!("Received Ctrl-C, initiating graceful shutdown");
                }
            }
        }

        trigger.cancel();
    });

    token
}
