//! Response composition.
//!
//! # Responsibilities
//! - Encode the finalized record as the response body
//! - Add framing headers (`Server`, `Content-Type`, `Content-Length`)
//! - Append CORS headers derived from the request
//!
//! # Design Decisions
//! - Status is always 200
//! - Encoding failures never fail the response: the body falls back to a
//!   fixed placeholder and `Content-Length` is computed from it

use crate::echo::cors::cors_headers;
use crate::echo::encoder::encode;
use crate::echo::record::{HeaderList, RequestRecord};

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "request-echo";

/// Content type of every response body.
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Body sent when a record cannot be encoded.
pub const PLACEHOLDER_BODY: &[u8] = b"Empty";

/// A composed response, independent of any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl EchoResponse {
    /// Look up a response header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Build the response for a finalized record.
pub fn compose(record: &RequestRecord) -> EchoResponse {
    let body = match encode(record) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                method = %record.method(),
                path = %record.path(),
                error = %e,
                "Failed to encode request record, sending placeholder"
            );
            PLACEHOLDER_BODY.to_vec()
        }
    };

    build(record.headers(), body)
}

fn build(request_headers: &HeaderList, body: Vec<u8>) -> EchoResponse {
    let mut headers = vec![
        ("Server".to_string(), SERVER_NAME.to_string()),
        ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
        ("Content-Length".to_string(), body.len().to_string()),
    ];
    headers.extend(
        cors_headers(request_headers)
            .into_iter()
            .map(|(name, value)| (name.to_string(), value)),
    );

    EchoResponse {
        status: 200,
        headers,
        body,
    }
}
