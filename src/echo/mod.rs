//! Transport-agnostic request echo core.
//!
//! # Data Flow
//! ```text
//! Transport adapter (net / http)
//!     → connection.rs (head → body* → end state machine)
//!     → record.rs (RequestRecord assembled per request)
//!     → response.rs (status, framing headers)
//!         → encoder.rs (pretty JSON body)
//!         → cors.rs (reflected Origin headers)
//!     → ResponseSink::write (adapter writes bytes)
//! ```
//!
//! # Design Decisions
//! - One `Connection` per connection, owned by a single task
//! - No shared mutable state; adapters only pass read-only settings
//! - Adapters implement `ResponseSink` and feed events, nothing more

pub mod connection;
pub mod cors;
pub mod encoder;
pub mod error;
pub mod record;
pub mod response;

pub use connection::{Connection, ConnectionState, ResponseSink};
pub use error::ConnectionError;
pub use record::{HeaderList, RequestHead, RequestRecord};
pub use response::EchoResponse;
