//! Command-line parsing.
//!
//! # Responsibilities
//! - Map `--hostname`, `--port` and the tuning flags onto `EchoConfig`
//! - Ignore unrecognized flags
//! - Fall back to defaults for missing or malformed values
//!
//! # Design Decisions
//! - Arguments are filtered to known flags before clap sees them, so stray
//!   flags never abort startup
//! - Values are taken as strings and converted afterwards, so a bad value
//!   degrades to the default instead of a usage error

use clap::Parser;

use crate::config::schema::{EchoConfig, Transport};

const VALUE_FLAGS: &[&str] = &[
    "--hostname",
    "--port",
    "--transport",
    "--idle-timeout-secs",
    "--max-body-bytes",
];

const STANDALONE_FLAGS: &[&str] = &["--help", "-h", "--version", "-V"];

#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "request-echo", version)]
#[command(about = "Echo every HTTP request back to the caller as JSON", long_about = None)]
pub struct Cli {
    /// Address to bind.
    #[arg(long, allow_hyphen_values = true)]
    pub hostname: Option<String>,

    /// Port to bind.
    #[arg(long, allow_hyphen_values = true)]
    pub port: Option<String>,

    /// Transport adapter: raw or axum.
    #[arg(long, allow_hyphen_values = true)]
    pub transport: Option<String>,

    /// Abandon connections idle for this many seconds.
    #[arg(long, allow_hyphen_values = true)]
    pub idle_timeout_secs: Option<String>,

    /// Maximum request body size in bytes.
    #[arg(long, allow_hyphen_values = true)]
    pub max_body_bytes: Option<String>,
}

impl Cli {
    /// Parse the process arguments leniently.
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args())
    }

    /// Parse an argument list leniently. The first item is the program name.
    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let filtered = filter_known(args.into_iter().map(Into::into).collect());

        match Cli::try_parse_from(filtered) {
            Ok(cli) => cli,
            Err(e) => match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    e.exit()
                }
                _ => {
                    tracing::warn!(error = %e, "Ignoring unparsable arguments");
                    Cli::default()
                }
            },
        }
    }

    /// Convert parsed flags into configuration, applying defaults.
    pub fn into_config(self) -> EchoConfig {
        let mut config = EchoConfig::default();

        if let Some(hostname) = self.hostname.filter(|h| !h.is_empty()) {
            config.listener.hostname = hostname;
        }

        if let Some(port) = self.port {
            match port.parse::<u16>() {
                Ok(port) => config.listener.port = port,
                Err(_) => tracing::warn!(
                    value = %port,
                    default = config.listener.port,
                    "Invalid --port, using default"
                ),
            }
        }

        if let Some(transport) = self.transport {
            match transport.parse::<Transport>() {
                Ok(transport) => config.listener.transport = transport,
                Err(e) => tracing::warn!(error = %e, "Invalid --transport, using default"),
            }
        }

        config.timeouts.idle_secs = positive(self.idle_timeout_secs, "--idle-timeout-secs");
        config.limits.max_body_bytes = positive(self.max_body_bytes, "--max-body-bytes");

        config
    }
}

/// Parse an optional positive integer; zero and garbage mean "unset".
fn positive<T>(value: Option<String>, flag: &str) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value = value?;
    match value.parse::<T>() {
        Ok(n) if n != T::default() => Some(n),
        _ => {
            tracing::warn!(flag, value = %value, "Ignoring invalid value");
            None
        }
    }
}

/// Keep the program name, known flags and their values; drop everything else.
fn filter_known(args: Vec<String>) -> Vec<String> {
    let mut iter = args.into_iter();
    let mut kept: Vec<String> = iter.next().into_iter().collect();

    while let Some(arg) = iter.next() {
        if STANDALONE_FLAGS.contains(&arg.as_str()) {
            kept.push(arg);
            continue;
        }

        if let Some((flag, _)) = arg.split_once('=') {
            if VALUE_FLAGS.contains(&flag) {
                kept.push(arg);
            }
            continue;
        }

        if VALUE_FLAGS.contains(&arg.as_str()) {
            // A trailing flag with no value keeps its default.
            if let Some(value) = iter.next() {
                kept.push(arg);
                kept.push(value);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> EchoConfig {
        let mut argv = vec!["request-echo"];
        argv.extend_from_slice(args);
        Cli::parse_lenient_from(argv).into_config()
    }

    #[test]
    fn defaults() {
        assert_eq!(parse(&[]), EchoConfig::default());
    }

    #[test]
    fn hostname_and_port() {
        let config = parse(&["--hostname", "127.0.0.1", "--port", "9090"]);
        assert_eq!(config.listener.bind_address(), "127.0.0.1:9090");
    }

    #[test]
    fn malformed_port_falls_back() {
        assert_eq!(parse(&["--port", "eighty"]).listener.port, 8000);
        assert_eq!(parse(&["--port", "70000"]).listener.port, 8000);
        assert_eq!(parse(&["--port", "-1"]).listener.port, 8000);
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let config = parse(&["--verbose", "--port", "8123", "stray", "--color", "always"]);
        assert_eq!(config.listener.port, 8123);
        assert_eq!(config.listener.hostname, "0.0.0.0");
    }

    #[test]
    fn missing_value_keeps_default() {
        assert_eq!(parse(&["--hostname"]).listener.hostname, "0.0.0.0");
        assert_eq!(parse(&["--port"]).listener.port, 8000);
    }

    #[test]
    fn equals_form_is_accepted() {
        let config = parse(&["--port=8081", "--transport=axum"]);
        assert_eq!(config.listener.port, 8081);
        assert_eq!(config.listener.transport, Transport::Axum);
    }

    #[test]
    fn tuning_flags() {
        let config = parse(&["--idle-timeout-secs", "30", "--max-body-bytes", "0"]);
        let settings = config.connection_settings();
        assert_eq!(settings.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.max_body_bytes, None);
    }
}
