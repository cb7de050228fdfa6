//! Cache Entry Module
//!
//! Defines a cached origin response.

use axum::http::HeaderMap;
use bytes::Bytes;
use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A cached origin response, stored under its request key.
///
/// Entries are immutable once stored. A newer response for the same key is a
/// new entry, never an in-place update.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Request path and query the response was fetched for
    pub key: String,
    /// Response headers, in origin order (multi-valued)
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// When the entry was handed to the cache
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    pub fn new(key: impl Into<String>, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            headers,
            body: body.into(),
            stored_at: Utc::now(),
        }
    }

    // == Age ==
    /// Returns how long ago the entry was created, in milliseconds.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.stored_at).num_milliseconds().max(0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_entry_creation() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let entry = CacheEntry::new("/index.html?v=1", headers, "hello");

        assert_eq!(entry.key, "/index.html?v=1");
        assert_eq!(entry.body, Bytes::from_static(b"hello"));
        assert_eq!(entry.headers["content-type"], "text/plain");
    }

    #[test]
    fn test_entry_keeps_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let entry = CacheEntry::new("/", headers, Bytes::new());

        let cookies: Vec<&str> = entry
            .headers
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_entry_age_is_non_negative() {
        let entry = CacheEntry::new("/", HeaderMap::new(), Bytes::new());
        assert!(entry.age_ms() >= 0);
    }
}
