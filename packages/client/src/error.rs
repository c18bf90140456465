//! Error types for the CLI client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered the handshake with an HTTP error status
    #[error("Handshake rejected: {0}")]
    Rejected(String),

    /// The server sent a `disconnect` event with this reason, then closed
    #[error("Disconnected by server: {0}")]
    Disconnected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
