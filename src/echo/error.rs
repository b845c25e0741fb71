//! Connection-level error definitions.

use thiserror::Error;

use crate::echo::connection::ConnectionState;

/// Errors that end a connection without a response.
///
/// Encoding failures are not listed here: the composer recovers from them
/// locally with a placeholder body.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The request head could not be parsed.
    #[error("Malformed request head: {0}")]
    MalformedHead(String),

    /// The request body framing could not be decoded.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The underlying connection failed or was closed by the peer.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// No data arrived within the configured idle timeout.
    #[error("Connection idle for more than {0} seconds")]
    IdleTimeout(u64),

    /// The request body exceeded the configured cap.
    #[error("Request body exceeds limit of {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// A transport event arrived out of order.
    #[error("Unexpected {event} event in state {state:?}")]
    UnexpectedEvent {
        event: &'static str,
        state: ConnectionState,
    },
}

impl ConnectionError {
    /// Whether the peer simply went away, as opposed to sending bad data.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, ConnectionError::Transport(_) | ConnectionError::IdleTimeout(_))
    }
}
