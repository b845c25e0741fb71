//! HTTP request echo library.
//!
//! `echo` holds the transport-agnostic core; `net` and `http` are the raw
//! TCP and Axum adapters that feed it.

// Core
pub mod echo;

// Transports
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::EchoConfig;
pub use echo::{Connection, ConnectionError, EchoResponse, RequestRecord};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::Listener;
