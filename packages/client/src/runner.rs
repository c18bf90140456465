//! Client execution logic with reconnection support.

use crate::{
    domain::ReconnectPolicy,
    error::ClientError,
    session::{SessionEnd, run_client_session},
    ui::spawn_line_reader,
};

/// Run the WebSocket client with reconnection logic
///
/// Returns `Ok(())` when the user exits, or the last error once reconnection
/// is given up.
pub async fn run_client(url: String) -> Result<(), ClientError> {
    let policy = ReconnectPolicy::default();
    let mut input = spawn_line_reader();
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            reconnect_count + 1,
            policy.max_attempts
        );

        match run_client_session(&url, &mut input).await {
            Ok(SessionEnd::UserExit) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                let Some(delay) = policy.next_delay(&e, reconnect_count) else {
                    tracing::error!("Giving up after {} attempt(s)", reconnect_count);
                    return Err(e);
                };

                tracing::info!(
                    "Reconnecting in {:?}... (attempt {}/{})",
                    delay,
                    reconnect_count + 1,
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
