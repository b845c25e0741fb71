//! TCP listener and accept loop for the raw transport.
//!
//! # Responsibilities
//! - Bind to the configured hostname and port
//! - Accept incoming TCP connections
//! - Spawn one tracked task per connection
//! - Stop accepting on shutdown, then drain in-flight connections

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::{ConnectionSettings, ListenerConfig};
use crate::net::connection::{serve_connection, ConnectionId};

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long in-flight connections may run after shutdown before being aborted.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind { address: String, source: std::io::Error },
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
        }
    }
}

/// A bound TCP listener.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address. Hostnames are resolved by Tokio.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: address.clone(),
                source,
            })?;

        if let Ok(local_addr) = listener.local_addr() {
            tracing::info!(address = %local_addr, "Listener bound");
        }

        Ok(Self { inner: listener })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Hand the socket to another server implementation.
    pub fn into_inner(self) -> TcpListener {
        self.inner
    }

    /// Accept connections until shutdown is signalled.
    ///
    /// Returns once every accepted connection has closed, or after
    /// [`DRAIN_TIMEOUT`] with the stragglers aborted.
    pub async fn run(self, settings: ConnectionSettings, mut shutdown: broadcast::Receiver<()>) {
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.inner.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
                // Reap finished connections so the set stays small.
                Some(_) = connections.join_next(), if !connections.is_empty() => continue,
                _ = shutdown.recv() => break,
            };

            let id = ConnectionId::new();
            let span = tracing::debug_span!("connection", connection_id = %id, peer_addr = %peer);

            connections.spawn(
                async move {
                    tracing::debug!("Connection accepted");
                    match serve_connection(stream, Some(peer), settings).await {
                        Ok(()) => tracing::trace!("Connection closed"),
                        Err(e) if e.is_abandoned() => {
                            tracing::debug!(error = %e, "Connection abandoned")
                        }
                        Err(e) => tracing::warn!(error = %e, "Connection closed without response"),
                    }
                }
                .instrument(span),
            );
        }

        tracing::info!(in_flight = connections.len(), "Listener stopped accepting");

        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::warn!(aborted = connections.len(), "Drain timeout reached");
            connections.shutdown().await;
        }
    }
}
