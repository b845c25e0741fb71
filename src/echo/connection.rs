//! Per-connection request assembly.
//!
//! # Responsibilities
//! - Accept transport events in order: head, body chunks, end
//! - Build the `RequestRecord` and finalize it at the end marker
//! - Compose the response and hand it to the adapter's `ResponseSink`
//! - Reset for the next request on keep-alive, or close
//!
//! # States
//! ```text
//! Idle --head--> Assembling --body*--> Assembling --end--> Finalized
//!     --write--> Responded --finish(keep_alive)--> Idle | Closed
//!
//! any --error--> Closed (record discarded, nothing written)
//! ```

use std::future::Future;

use crate::echo::error::ConnectionError;
use crate::echo::record::{RequestHead, RequestRecord};
use crate::echo::response::{compose, EchoResponse};

/// Destination for a composed response, provided by each transport adapter.
pub trait ResponseSink {
    /// Write the full response to the peer.
    fn write(&mut self, response: EchoResponse) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for a request head.
    Idle,
    /// Head received, accumulating body bytes.
    Assembling,
    /// End marker seen, response composed but not yet written.
    Finalized,
    /// Response written.
    Responded,
    /// Connection finished or abandoned.
    Closed,
}

/// State machine driving one connection.
///
/// Owned by a single task; nothing in here is shared across connections.
#[derive(Debug)]
pub struct Connection {
    origin: Option<String>,
    max_body_bytes: Option<usize>,
    state: ConnectionState,
    record: Option<RequestRecord>,
    body: Vec<u8>,
    response: Option<EchoResponse>,
}

impl Connection {
    /// Create a connection for a peer. `max_body_bytes` of `None` buffers
    /// bodies without limit.
    pub fn new(origin: Option<String>, max_body_bytes: Option<usize>) -> Self {
        Self {
            origin,
            max_body_bytes,
            state: ConnectionState::Idle,
            record: None,
            body: Vec::new(),
            response: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The finalized record, once the end marker has been seen.
    pub fn record(&self) -> Option<&RequestRecord> {
        match self.state {
            ConnectionState::Finalized | ConnectionState::Responded => self.record.as_ref(),
            _ => None,
        }
    }

    /// Start a new request from its head.
    pub fn on_head(&mut self, head: RequestHead) -> Result<(), ConnectionError> {
        self.expect(ConnectionState::Idle, "head")?;

        if head.method.is_empty() || head.target.is_empty() {
            self.close();
            return Err(ConnectionError::MalformedHead(
                "missing method or request target".to_string(),
            ));
        }

        self.record = Some(RequestRecord::from_head(head, self.origin.clone()));
        self.body.clear();
        self.state = ConnectionState::Assembling;
        Ok(())
    }

    /// Append a fragment of the request body.
    pub fn on_body_chunk(&mut self, chunk: &[u8]) -> Result<(), ConnectionError> {
        self.expect(ConnectionState::Assembling, "body")?;

        if let Some(limit) = self.max_body_bytes {
            if self.body.len() + chunk.len() > limit {
                self.close();
                return Err(ConnectionError::BodyTooLarge { limit });
            }
        }

        self.body.extend_from_slice(chunk);
        Ok(())
    }

    /// Finalize the record and compose its response.
    pub fn on_end(&mut self) -> Result<(), ConnectionError> {
        self.expect(ConnectionState::Assembling, "end")?;

        let Some(record) = self.record.as_mut() else {
            self.close();
            return Err(ConnectionError::UnexpectedEvent {
                event: "end",
                state: ConnectionState::Assembling,
            });
        };

        if !self.body.is_empty() {
            record.set_body(String::from_utf8_lossy(&self.body).into_owned());
            self.body = Vec::new();
        }

        let response = compose(record);

        tracing::info!(
            method = %record.method(),
            path = %record.path(),
            origin = record.origin().unwrap_or("UNKNOWN"),
            "Request captured"
        );
        tracing::debug!(payload = %String::from_utf8_lossy(&response.body), "Echo payload");

        self.response = Some(response);
        self.state = ConnectionState::Finalized;
        Ok(())
    }

    /// Write the composed response through the adapter's sink.
    pub async fn respond<S: ResponseSink>(&mut self, sink: &mut S) -> Result<(), ConnectionError> {
        self.expect(ConnectionState::Finalized, "write")?;

        let Some(response) = self.response.take() else {
            self.close();
            return Err(ConnectionError::UnexpectedEvent {
                event: "write",
                state: ConnectionState::Finalized,
            });
        };

        if let Err(e) = sink.write(response).await {
            self.close();
            return Err(ConnectionError::Transport(e));
        }

        self.state = ConnectionState::Responded;
        Ok(())
    }

    /// Release the finished request and either wait for the next one or close.
    pub fn finish(&mut self, keep_alive: bool) {
        let responded = self.state == ConnectionState::Responded;
        self.close();
        if keep_alive && responded {
            self.state = ConnectionState::Idle;
        }
    }

    /// Abandon any in-progress request.
    pub fn on_transport_error(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.record = None;
        self.body = Vec::new();
        self.response = None;
        self.state = ConnectionState::Closed;
    }

    fn expect(
        &mut self,
        expected: ConnectionState,
        event: &'static str,
    ) -> Result<(), ConnectionError> {
        if self.state == expected {
            return Ok(());
        }
        let state = self.state;
        self.close();
        Err(ConnectionError::UnexpectedEvent { event, state })
    }
}
