//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse flags → Bind listener → Serve with chosen transport
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight connections
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - Bounded drain: raw connections still open after `DRAIN_TIMEOUT` are aborted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
