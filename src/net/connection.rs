//! Connection driver for the raw transport.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Feed reader events into the echo state machine
//! - Write responses back on the same stream
//! - Answer `Expect: 100-continue` before the body is read
//! - Keep the connection open or close it per keep-alive
//!
//! # Design Decisions
//! - Generic over the stream so tests can drive it with in-memory pipes
//! - Errors end the connection silently; nothing is written on failure

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::ConnectionSettings;
use crate::echo::{Connection, ConnectionError, EchoResponse, ResponseSink};
use crate::net::codec::{encode_response, RequestEvent, RequestReader, Version, CONTINUE_RESPONSE};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Writes composed responses onto an HTTP/1.x stream.
pub struct StreamSink<W> {
    inner: W,
    version: Version,
    keep_alive: bool,
}

impl<W: AsyncWrite + Unpin + Send> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            version: Version::Http11,
            keep_alive: true,
        }
    }

    /// Set the framing for the next response.
    fn prepare(&mut self, version: Version, keep_alive: bool) {
        self.version = version;
        self.keep_alive = keep_alive;
    }

    async fn write_continue(&mut self) -> std::io::Result<()> {
        self.inner.write_all(CONTINUE_RESPONSE).await?;
        self.inner.flush().await
    }

    async fn shutdown(&mut self) {
        let _ = self.inner.shutdown().await;
    }
}

impl<W: AsyncWrite + Unpin + Send> ResponseSink for StreamSink<W> {
    async fn write(&mut self, response: EchoResponse) -> std::io::Result<()> {
        let bytes = encode_response(&response, self.version, self.keep_alive);
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await
    }
}

/// Serve every request on one connection until it closes.
///
/// Returns `Ok` when the peer closes cleanly between requests or the last
/// response asked to close. Any error means the in-progress request was
/// dropped without a response.
pub async fn serve_connection<S>(
    stream: S,
    peer: Option<SocketAddr>,
    settings: ConnectionSettings,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Send,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = RequestReader::new(read_half, settings.idle_timeout);
    let mut sink = StreamSink::new(write_half);
    let mut conn = Connection::new(peer.map(|addr| addr.to_string()), settings.max_body_bytes);

    loop {
        let event = match reader.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                conn.finish(false);
                return Ok(());
            }
            Err(e) => {
                conn.on_transport_error();
                return Err(e);
            }
        };

        match event {
            RequestEvent::Head(head) => {
                conn.on_head(head)?;

                if reader.take_continue() {
                    if let Err(e) = sink.write_continue().await {
                        conn.on_transport_error();
                        return Err(e.into());
                    }
                }
            }
            RequestEvent::Body(chunk) => conn.on_body_chunk(&chunk)?,
            RequestEvent::End => {
                conn.on_end()?;

                let keep_alive = reader.keep_alive();
                sink.prepare(reader.version(), keep_alive);
                conn.respond(&mut sink).await?;
                conn.finish(keep_alive);

                if !keep_alive {
                    sink.shutdown().await;
                    return Ok(());
                }
            }
        }
    }
}
