//! Shutdown signal handling.

/// Ctrl+C を受け取るまで待つ
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
