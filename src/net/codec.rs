//! HTTP/1.1 request reader and response writer.
//!
//! # Responsibilities
//! - Split an inbound byte stream into `Head`, `Body*`, `End` events
//! - Decode `Content-Length` and `chunked` body framing
//! - Track keep-alive and `Expect: 100-continue` per request
//! - Serialize an `EchoResponse` onto the wire
//!
//! # Design Decisions
//! - Heads and chunk-size lines are parsed with `httparse`
//! - Header names keep the casing received
//! - Ambiguous framing (signed or conflicting `Content-Length`) is a malformed head
//! - Body bytes are forwarded as they arrive; nothing here buffers a whole body
//! - Bytes after one request stay buffered for the next (pipelining)
//! - A clean EOF between requests is not an error

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::echo::{ConnectionError, EchoResponse, HeaderList, RequestHead};

/// Largest accepted request head, and largest chunk-size or trailer line.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Interim response sent before reading a body the client is holding back.
pub const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

const READ_CHUNK: usize = 8 * 1024;

/// One transport event for the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    Head(RequestHead),
    Body(Vec<u8>),
    End,
}

/// HTTP version of the request being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    Size,
    Data(usize),
    DataEnd,
    Trailers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Head,
    Length(usize),
    Chunked(Chunk),
}

/// Incremental reader producing request events from a byte stream.
pub struct RequestReader<R> {
    inner: R,
    buf: Vec<u8>,
    phase: Phase,
    idle_timeout: Option<Duration>,
    version: Version,
    keep_alive: bool,
    continue_pending: bool,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(inner: R, idle_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            phase: Phase::Head,
            idle_timeout,
            version: Version::Http11,
            keep_alive: true,
            continue_pending: false,
        }
    }

    /// Version of the most recent request head.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether the connection stays open after the current request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Whether the current request waits for `100 Continue` before sending
    /// its body. Returns `true` at most once per request.
    pub fn take_continue(&mut self) -> bool {
        std::mem::take(&mut self.continue_pending)
    }

    /// Next event, or `None` when the peer closed cleanly between requests.
    pub async fn next_event(&mut self) -> Result<Option<RequestEvent>, ConnectionError> {
        loop {
            match self.phase {
                Phase::Head => {
                    // Tolerate stray CRLFs left between pipelined requests.
                    while self.buf.starts_with(b"\r\n") {
                        self.buf.drain(..2);
                    }

                    if let Some(end) = find(&self.buf, b"\r\n\r\n") {
                        let head: Vec<u8> = self.buf.drain(..end + 4).collect();
                        let parsed = parse_head(&head)?;
                        self.version = parsed.version;
                        self.keep_alive = parsed.keep_alive;
                        self.continue_pending = parsed.expect_continue;
                        self.phase = parsed.phase;
                        return Ok(Some(RequestEvent::Head(parsed.head)));
                    }

                    if self.buf.len() > MAX_HEAD_BYTES {
                        return Err(malformed(format!(
                            "request head exceeds {} bytes",
                            MAX_HEAD_BYTES
                        )));
                    }

                    if self.fill().await? == 0 {
                        if self.buf.is_empty() {
                            return Ok(None);
                        }
                        return Err(malformed("connection closed inside request head".to_string()));
                    }
                }
                Phase::Length(0) => {
                    self.phase = Phase::Head;
                    return Ok(Some(RequestEvent::End));
                }
                Phase::Length(remaining) => {
                    if self.buf.is_empty() {
                        self.fill_body().await?;
                        continue;
                    }
                    let take = remaining.min(self.buf.len());
                    let chunk: Vec<u8> = self.buf.drain(..take).collect();
                    self.phase = Phase::Length(remaining - take);
                    return Ok(Some(RequestEvent::Body(chunk)));
                }
                Phase::Chunked(Chunk::Size) => match httparse::parse_chunk_size(&self.buf) {
                    Ok(httparse::Status::Complete((consumed, size))) => {
                        self.buf.drain(..consumed);
                        let size = usize::try_from(size).map_err(|_| {
                            ConnectionError::MalformedBody(format!("chunk size {} too large", size))
                        })?;
                        self.phase = if size == 0 {
                            Phase::Chunked(Chunk::Trailers)
                        } else {
                            Phase::Chunked(Chunk::Data(size))
                        };
                    }
                    Ok(httparse::Status::Partial) => {
                        if self.buf.len() > MAX_HEAD_BYTES {
                            return Err(ConnectionError::MalformedBody(
                                "chunk size line too long".to_string(),
                            ));
                        }
                        self.fill_body().await?;
                    }
                    Err(httparse::InvalidChunkSize) => {
                        return Err(ConnectionError::MalformedBody(
                            "invalid chunk size".to_string(),
                        ));
                    }
                },
                Phase::Chunked(Chunk::Data(remaining)) => {
                    if self.buf.is_empty() {
                        self.fill_body().await?;
                        continue;
                    }
                    let take = remaining.min(self.buf.len());
                    let chunk: Vec<u8> = self.buf.drain(..take).collect();
                    self.phase = if take == remaining {
                        Phase::Chunked(Chunk::DataEnd)
                    } else {
                        Phase::Chunked(Chunk::Data(remaining - take))
                    };
                    return Ok(Some(RequestEvent::Body(chunk)));
                }
                Phase::Chunked(Chunk::DataEnd) => {
                    if self.buf.len() < 2 {
                        self.fill_body().await?;
                        continue;
                    }
                    if &self.buf[..2] != b"\r\n" {
                        return Err(ConnectionError::MalformedBody(
                            "missing CRLF after chunk data".to_string(),
                        ));
                    }
                    self.buf.drain(..2);
                    self.phase = Phase::Chunked(Chunk::Size);
                }
                Phase::Chunked(Chunk::Trailers) => {
                    let Some(line) = self.take_line().await? else {
                        continue;
                    };
                    // Trailer fields are read and discarded.
                    if line.is_empty() {
                        self.phase = Phase::Head;
                        return Ok(Some(RequestEvent::End));
                    }
                }
            }
        }
    }

    /// Pop one CRLF-terminated line, or read more and return `None`.
    async fn take_line(&mut self) -> Result<Option<Vec<u8>>, ConnectionError> {
        if let Some(end) = find(&self.buf, b"\r\n") {
            let mut line: Vec<u8> = self.buf.drain(..end + 2).collect();
            line.truncate(end);
            return Ok(Some(line));
        }
        if self.buf.len() > MAX_HEAD_BYTES {
            return Err(ConnectionError::MalformedBody("trailer line too long".to_string()));
        }
        self.fill_body().await?;
        Ok(None)
    }

    /// Read inside a body, where EOF means the peer abandoned the request.
    async fn fill_body(&mut self) -> Result<(), ConnectionError> {
        if self.fill().await? == 0 {
            return Err(ConnectionError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before end of request body",
            )));
        }
        Ok(())
    }

    async fn fill(&mut self) -> Result<usize, ConnectionError> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.read(&mut chunk))
                .await
                .map_err(|_| ConnectionError::IdleTimeout(limit.as_secs()))??,
            None => self.inner.read(&mut chunk).await?,
        };
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

struct ParsedHead {
    head: RequestHead,
    version: Version,
    keep_alive: bool,
    expect_continue: bool,
    phase: Phase,
}

/// Parse a complete head, terminating blank line included.
fn parse_head(bytes: &[u8]) -> Result<ParsedHead, ConnectionError> {
    // Every header field takes at least one CRLF-terminated line.
    let lines = bytes.windows(2).filter(|w| *w == b"\r\n").count();
    let mut slots = vec![httparse::EMPTY_HEADER; lines];
    let mut request = httparse::Request::new(&mut slots);

    match request.parse(bytes) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(malformed("incomplete request head".to_string()));
        }
        Err(e) => return Err(malformed(format!("invalid request head: {}", e))),
    }

    let (Some(method), Some(target), Some(minor)) = (request.method, request.path, request.version)
    else {
        return Err(malformed("missing method, target or version".to_string()));
    };
    let version = match minor {
        0 => Version::Http10,
        1 => Version::Http11,
        other => return Err(malformed(format!("unsupported version: HTTP/1.{}", other))),
    };

    let mut headers = HeaderList::new();
    let mut content_length: Option<usize> = None;
    for field in request.headers.iter() {
        let value = String::from_utf8_lossy(field.value);
        let value = value.trim_matches(|c: char| c == ' ' || c == '\t');

        // Checked here, before the list collapses repeated names.
        if field.name.eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(value)?;
            if content_length.is_some_and(|seen| seen != length) {
                return Err(malformed("conflicting content-length values".to_string()));
            }
            content_length = Some(length);
        }

        headers.insert(field.name, value);
    }

    let phase = body_phase(&headers, content_length)?;
    let keep_alive = keep_alive(&headers, version);
    let expect_continue = version == Version::Http11
        && phase != Phase::Length(0)
        && headers
            .get("expect")
            .is_some_and(|expect| expect.eq_ignore_ascii_case("100-continue"));

    Ok(ParsedHead {
        head: RequestHead::new(method, target, headers),
        version,
        keep_alive,
        expect_continue,
        phase,
    })
}

/// Digits only; a list of repeated identical values is accepted.
fn parse_content_length(value: &str) -> Result<usize, ConnectionError> {
    let mut length = None;
    for item in value.split(',').map(str::trim) {
        if item.is_empty() || !item.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(format!("invalid content-length: {:?}", value)));
        }
        let parsed = item
            .parse::<usize>()
            .map_err(|_| malformed(format!("content-length out of range: {:?}", value)))?;
        if length.is_some_and(|seen| seen != parsed) {
            return Err(malformed(format!("conflicting content-length: {:?}", value)));
        }
        length = Some(parsed);
    }
    length.ok_or_else(|| malformed("empty content-length".to_string()))
}

fn body_phase(
    headers: &HeaderList,
    content_length: Option<usize>,
) -> Result<Phase, ConnectionError> {
    if let Some(encoding) = headers.get("transfer-encoding") {
        let last = encoding.rsplit(',').next().unwrap_or_default().trim();
        if last.eq_ignore_ascii_case("chunked") {
            return Ok(Phase::Chunked(Chunk::Size));
        }
        return Err(malformed(format!("unsupported transfer-encoding: {:?}", encoding)));
    }

    Ok(Phase::Length(content_length.unwrap_or(0)))
}

fn keep_alive(headers: &HeaderList, version: Version) -> bool {
    let tokens = headers.get("connection").unwrap_or_default();
    let has = |token: &str| tokens.split(',').any(|t| t.trim().eq_ignore_ascii_case(token));

    match version {
        Version::Http11 => !has("close"),
        Version::Http10 => has("keep-alive"),
    }
}

fn malformed(reason: String) -> ConnectionError {
    ConnectionError::MalformedHead(reason)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Serialize a response for an HTTP/1.x peer.
///
/// A `Connection` header is added only when the outcome differs from the
/// version's default.
pub fn encode_response(response: &EchoResponse, version: Version, keep_alive: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(response.body.len() + 256);

    let status_line = format!(
        "{} {} {}\r\n",
        version.as_str(),
        response.status,
        reason(response.status)
    );
    out.extend_from_slice(status_line.as_bytes());
    for (name, value) in &response.headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    match (version, keep_alive) {
        (Version::Http11, false) => out.extend_from_slice(b"Connection: close\r\n"),
        (Version::Http10, true) => out.extend_from_slice(b"Connection: keep-alive\r\n"),
        _ => {}
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.body);
    out
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        _ => "",
    }
}
