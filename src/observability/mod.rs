//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (connection_id, peer_addr, method, path)
//!     → logging.rs (subscriber, env filter, fmt output)
//! ```

pub mod logging;
