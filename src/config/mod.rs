//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line
//!     → cli.rs (lenient flag parsing, defaults on bad values)
//!     → EchoConfig (immutable once built)
//!     → ConnectionSettings (copied into every connection task)
//! ```
//!
//! # Design Decisions
//! - No config files or environment variables; flags only
//! - All fields have defaults so an empty command line is valid
//! - Startup never fails on a bad flag value

pub mod cli;
pub mod schema;

pub use cli::Cli;
pub use schema::{
    ConnectionSettings, EchoConfig, LimitsConfig, ListenerConfig, TimeoutConfig, Transport,
};
