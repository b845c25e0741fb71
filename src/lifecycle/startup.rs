//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listening socket (fatal on failure)
//! - Start the configured transport on it
//!
//! # Design Decisions
//! - Binding is separate from serving so callers can learn the bound
//!   address (port 0 in tests) before traffic starts

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{EchoConfig, Transport};
use crate::http::HttpServer;
use crate::net::{Listener, ListenerError};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The listening socket could not be bound.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// The server failed while running.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind the configured listener.
pub async fn bind(config: &EchoConfig) -> Result<Listener, StartupError> {
    Ok(Listener::bind(&config.listener).await?)
}

/// Serve on an already bound listener until shutdown is signalled.
pub async fn serve(
    listener: Listener,
    config: EchoConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let settings = config.connection_settings();
    let address = listener.local_addr()?;

    tracing::info!(
        address = %address,
        transport = %config.listener.transport,
        idle_timeout_secs = ?config.timeouts.idle_secs,
        max_body_bytes = ?config.limits.max_body_bytes,
        "Serving requests"
    );

    match config.listener.transport {
        Transport::Raw => listener.run(settings, shutdown).await,
        Transport::Axum => HttpServer::new(&config).run(listener.into_inner(), shutdown).await?,
    }

    Ok(())
}
