//! Captured request data.
//!
//! # Responsibilities
//! - Hold the method, raw target, headers, peer origin and body of one request
//! - Case-insensitive header lookup that still reports the received casing
//!
//! # Design Decisions
//! - Repeated headers are last-write-wins: the later value and casing replace
//!   the earlier entry, which keeps its original position
//! - Records are only mutated by the owning `Connection` while assembling

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered header collection with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    /// Create an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any existing entry with the same name
    /// (compared case-insensitively).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a header value by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderList::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl Serialize for HeaderList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parsed request head as delivered by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// HTTP verb exactly as received.
    pub method: String,
    /// Raw request target, not URL-decoded.
    pub target: String,
    /// Request headers.
    pub headers: HeaderList,
}

impl RequestHead {
    pub fn new(method: impl Into<String>, target: impl Into<String>, headers: HeaderList) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            headers,
        }
    }
}

/// One fully received request.
///
/// Field order here is the key order of the encoded JSON document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RequestRecord {
    path: String,
    headers: HeaderList,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    origin: Option<String>,
    method: String,
}

impl RequestRecord {
    /// Start a record from a request head and the transport-reported peer.
    pub fn from_head(head: RequestHead, origin: Option<String>) -> Self {
        Self {
            path: head.target,
            headers: head.headers,
            body: None,
            origin,
            method: head.method,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderList::new();
        headers.insert("Origin", "http://example.com");

        assert_eq!(headers.get("origin"), Some("http://example.com"));
        assert_eq!(headers.get("ORIGIN"), Some("http://example.com"));
        assert!(headers.get("host").is_none());
    }

    #[test]
    fn repeated_header_last_write_wins() {
        let headers: HeaderList = vec![
            ("X-Trace", "first"),
            ("Accept", "*/*"),
            ("x-trace", "second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("X-TRACE"), Some("second"));

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x-trace", "Accept"]);
    }

    #[test]
    fn record_from_head_has_no_body() {
        let head = RequestHead::new("GET", "/a?b=c", HeaderList::new());
        let record = RequestRecord::from_head(head, Some("127.0.0.1:5000".into()));

        assert_eq!(record.method(), "GET");
        assert_eq!(record.path(), "/a?b=c");
        assert_eq!(record.origin(), Some("127.0.0.1:5000"));
        assert!(record.body().is_none());
    }
}
