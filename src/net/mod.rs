//! Raw TCP transport.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, one task per connection)
//!     → connection.rs (connection ID, event loop, keep-alive)
//!     → codec.rs (bytes → head / body / end events, response → bytes)
//!     → echo::Connection (assembly and composition)
//! ```
//!
//! # Design Decisions
//! - Header casing is preserved end to end
//! - Malformed heads close the socket without writing anything
//! - Connections share nothing but copied settings

pub mod codec;
pub mod connection;
pub mod listener;

pub use connection::{serve_connection, ConnectionId};
pub use listener::{Listener, ListenerError};
