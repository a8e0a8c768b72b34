//! Response envelope shared by every pipeline verb.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;

use crate::pagination::Pagination;

/// Status and headers of a received response, independent of the body type.
///
/// Header names are lower-cased so interceptors and callers can match
/// without case juggling.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
}

impl ResponseParts {
    /// Look up a header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// A successful, typed response.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Deserialized body.
    pub data: T,
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// Pagination parsed from the WordPress collection headers, when
    /// present.
    pub pagination: Option<Pagination>,
}

/// Collect a `reqwest` header map into lower-cased name/value pairs.
///
/// Non-UTF-8 values are skipped; repeated headers keep the last value.
pub(crate) fn lowercase_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_ascii_lowercase(), value.to_owned());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    use super::*;

    #[test]
    fn header_names_are_lowercased() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-wp-total"),
            HeaderValue::from_static("42"),
        );
        headers.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );

        let map = lowercase_headers(&headers);
        assert_eq!(map.get("x-wp-total").map(String::as_str), Some("42"));

        let parts = ResponseParts { status: 200, headers: map };
        assert_eq!(parts.header("X-WP-Total"), Some("42"));
        assert_eq!(parts.header("missing"), None);
    }
}
