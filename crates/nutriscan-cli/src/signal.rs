//! Interrupt signal handling.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use crate::TRACING_TARGET_SHUTDOWN;

/// Waits for an interrupt signal (SIGTERM or SIGINT/Ctrl+C).
///
/// If a handler cannot be installed, the corresponding signal is never
/// reported and the other one still is.
pub async fn interrupt_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_SHUTDOWN,
                    "Received Ctrl+C signal, cancelling run"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "Failed to install Ctrl+C handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(
                    target: TRACING_TARGET_SHUTDOWN,
                    "Received SIGTERM signal, cancelling run"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
