//! Axum transport.
//!
//! # Data Flow
//! ```text
//! TCP connection (owned by hyper)
//!     → server.rs (Router: GET/POST/PUT/DELETE on "/" and "/{*path}")
//!     → echo_handler (head from request parts, body from data frames)
//!     → echo::Connection (assembly and composition)
//!     → EchoResponse → axum Response
//! ```

pub mod server;

pub use server::HttpServer;
