use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{error, info};

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl-C).
///
/// When the signal is received, cancels the provided token so the engine
/// stops advancing and the scheduler stops firing.
pub async fn wait_for_shutdown_signal(token: CancellationToken) -> Result<(), std::io::Error> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            _ = ctrl_c => {
                info!(event = "cli.signal_received", signal = "SIGINT");
            }
            _ = sigterm.recv() => {
                info!(event = "cli.signal_received", signal = "SIGTERM");
            }
            _ = token.cancelled() => return Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = ctrl_c => match result {
                Ok(()) => {
                    info!(event = "cli.signal_received", signal = "SIGINT");
                }
                Err(e) => {
                    error!(
                        event = "cli.signal_handler_failed",
                        error = %e,
                        "Ctrl-C signal handler failed, cancelling anyway",
                    );
                }
            },
            _ = token.cancelled() => return Ok(()),
        }
    }

    eprintln!("Interrupted; stopping after the current stage.");
    token.cancel();
    Ok(())
}
