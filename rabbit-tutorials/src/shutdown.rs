//! OS shutdown signals.

use tokio::signal;
use tracing::info;

/// Complete when SIGINT (Ctrl+C) or, on unix, SIGTERM arrives.
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
        Ok::<(), std::io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            info!("Received SIGINT");
        }
        result = terminate => {
            result?;
            info!("Received SIGTERM");
        }
    }

    Ok(())
}
