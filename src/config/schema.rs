//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the echo
//! server. All sections have defaults so an empty command line is valid.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration for the echo server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoConfig {
    /// Listener configuration (hostname, port, transport).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,
}

impl EchoConfig {
    /// Read-only settings shared by every connection.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            idle_timeout: self.timeouts.idle_secs.map(Duration::from_secs),
            max_body_bytes: self.limits.max_body_bytes,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Hostname or IP address to bind.
    pub hostname: String,

    /// TCP port to bind.
    pub port: u16,

    /// Which transport adapter serves connections.
    pub transport: Transport,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 8000,
            transport: Transport::Raw,
        }
    }
}

/// Transport adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Tokio TCP acceptor with the built-in HTTP/1.1 reader.
    #[default]
    Raw,
    /// Axum catch-all router.
    Axum,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Transport::Raw),
            "axum" => Ok(Transport::Axum),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Raw => write!(f, "raw"),
            Transport::Axum => write!(f, "axum"),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Abandon a connection when no bytes arrive for this many seconds.
    /// `None` waits forever.
    pub idle_secs: Option<u64>,
}

/// Request limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum buffered body size in bytes. `None` is unbounded.
    pub max_body_bytes: Option<usize>,
}

/// Per-connection settings derived from `EchoConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub idle_timeout: Option<Duration>,
    pub max_body_bytes: Option<usize>,
}
