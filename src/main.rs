//! request-echo
//!
//! Answers every HTTP request with a JSON description of what was received.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 REQUEST ECHO                  │
//!                         │                                              │
//!     Client Request      │  ┌──────────┐      ┌───────────────────┐     │
//!     ────────────────────┼─▶│ net      │─────▶│ echo::Connection  │     │
//!                         │  │ (raw)    │      │ head → body → end │     │
//!                         │  ├──────────┤      └─────────┬─────────┘     │
//!                         │  │ http     │────────────────┤               │
//!                         │  │ (axum)   │                ▼               │
//!                         │  └──────────┘      ┌───────────────────┐     │
//!     Client Response     │       ▲            │ response composer │     │
//!     ◀───────────────────┼───────┴────────────│ json + cors       │     │
//!                         │                    └───────────────────┘     │
//!                         │                                              │
//!                         │   config · observability · lifecycle         │
//!                         └──────────────────────────────────────────────┘
//! ```

use request_echo::config::Cli;
use request_echo::lifecycle::{startup, Shutdown};
use request_echo::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!("request-echo v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Cli::parse_lenient().into_config();

    // The service cannot run without its socket.
    let listener = match startup::bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            std::process::exit(1);
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    startup::serve(listener, config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
