//! JSON encoding of captured requests.
//!
//! Output is pretty-printed with two-space indentation. Keys appear as
//! `path`, `headers`, `body` (omitted when absent), `origin` (null when
//! absent), `method`. Identical records always encode to identical bytes.

use crate::echo::record::RequestRecord;

/// Serialize a record into its pretty-printed JSON payload.
pub fn encode(record: &RequestRecord) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::record::{HeaderList, RequestHead};

    fn sample(origin: Option<&str>) -> RequestRecord {
        let mut headers = HeaderList::new();
        headers.insert("Host", "localhost:8000");
        headers.insert("User-Agent", "curl/8.0");
        RequestRecord::from_head(
            RequestHead::new("GET", "/foo/bar", headers),
            origin.map(str::to_string),
        )
    }

    #[test]
    fn keys_are_ordered_and_body_omitted() {
        let json = String::from_utf8(encode(&sample(Some("10.0.0.1:4242"))).unwrap()).unwrap();

        let expected = r#"{
  "path": "/foo/bar",
  "headers": {
    "Host": "localhost:8000",
    "User-Agent": "curl/8.0"
  },
  "origin": "10.0.0.1:4242",
  "method": "GET"
}"#;
        assert_eq!(json, expected);
        assert!(!json.contains("\"body\""));
    }

    #[test]
    fn missing_origin_encodes_as_null() {
        let bytes = encode(&sample(None)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value["origin"].is_null());
        assert!(value.get("body").is_none());
    }

    #[test]
    fn body_is_encoded_as_string() {
        let mut record = sample(None);
        record.set_body(r#"{"x":1}"#.to_string());

        let value: serde_json::Value = serde_json::from_slice(&encode(&record).unwrap()).unwrap();
        assert_eq!(value["body"], r#"{"x":1}"#);
    }

    #[test]
    fn encoding_is_deterministic() {
        let record = sample(Some("10.0.0.1:4242"));
        assert_eq!(encode(&record).unwrap(), encode(&record.clone()).unwrap());
    }
}
