//! CORS response headers.
//!
//! The policy reflects any request `Origin` back verbatim. There is no
//! allow-list: every origin is accepted. This is permissive on purpose for a
//! diagnostic endpoint and must not be used in front of anything sensitive.

use crate::echo::record::HeaderList;

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
pub const ALLOW_METHODS: &str = "access-control-allow-methods";
pub const MAX_AGE: &str = "access-control-max-age";

const ALLOWED_HEADERS: &str = "accept, authorization, content-type, origin, x-requested-with";
const ALLOWED_METHODS: &str = "GET, POST, PUT, OPTIONS, DELETE, PATCH";
const MAX_AGE_SECS: &str = "600";

/// Derive CORS headers for a request.
///
/// Returns an empty list when the request carries no `Origin` header.
pub fn cors_headers(request_headers: &HeaderList) -> Vec<(&'static str, String)> {
    let Some(origin) = request_headers.get("origin") else {
        return Vec::new();
    };

    vec![
        (ALLOW_ORIGIN, origin.to_string()),
        (ALLOW_HEADERS, ALLOWED_HEADERS.to_string()),
        (ALLOW_METHODS, ALLOWED_METHODS.to_string()),
        (MAX_AGE, MAX_AGE_SECS.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_reflected() {
        let mut headers = HeaderList::new();
        headers.insert("Origin", "http://example.com");

        let cors = cors_headers(&headers);
        assert_eq!(
            cors,
            vec![
                (ALLOW_ORIGIN, "http://example.com".to_string()),
                (
                    ALLOW_HEADERS,
                    "accept, authorization, content-type, origin, x-requested-with".to_string()
                ),
                (ALLOW_METHODS, "GET, POST, PUT, OPTIONS, DELETE, PATCH".to_string()),
                (MAX_AGE, "600".to_string()),
            ]
        );
    }

    #[test]
    fn no_origin_no_headers() {
        let mut headers = HeaderList::new();
        headers.insert("Host", "localhost");
        assert!(cors_headers(&headers).is_empty());
    }

    #[test]
    fn any_origin_is_accepted() {
        let mut headers = HeaderList::new();
        headers.insert("origin", "https://evil.invalid");
        assert_eq!(cors_headers(&headers)[0].1, "https://evil.invalid");
    }
}
