//! Proxy Handler
//!
//! Serves cached responses and forwards misses to the origin.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::{debug, warn};

use crate::cache::CacheClient;
use crate::error::ProxyError;
use crate::proxy::{CACHE_STATUS_HEADER, MAX_REQUEST_BODY};

/// Shared state of the proxy handler.
#[derive(Clone)]
pub struct ProxyState {
    /// Upstream HTTP client (keeps a cookie store across requests)
    pub client: reqwest::Client,
    /// Origin scheme, host and port; path and query come from each request
    pub origin: Url,
    pub cache: CacheClient,
}

impl ProxyState {
    pub fn new(origin: Url, cache: CacheClient) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            origin,
            cache,
        })
    }
}

/// Fallback handler: every request is proxied.
///
/// The cache key is the request path and query; method and host are not
/// part of it.
pub async fn proxy_handler(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let key = cache_key(&request);
    let url = upstream_url(&state.origin, request.uri());

    if let Some(entry) = state.cache.check(&key).await {
        debug!("X-Cache: HIT {}", key);
        let mut response = (StatusCode::OK, entry.body.clone()).into_response();
        copy_headers(response.headers_mut(), &entry.headers);
        mark(&mut response, "HIT");
        return Ok(response);
    }
    debug!("X-Cache: MISS {}", key);

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| ProxyError::Body(e.to_string()))?;

    let mut forwarded = HeaderMap::new();
    copy_headers(&mut forwarded, &parts.headers);
    forwarded.remove(header::HOST);

    let upstream = state
        .client
        .request(parts.method, url)
        .headers(forwarded)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let bytes = upstream.bytes().await?;

    // Every completed round trip is cached, whatever its status
    if let Err(e) = state.cache.add(key.clone(), headers.clone(), bytes.clone()).await {
        warn!("Failed to cache response for '{}': {}", key, e);
    }

    let mut response = (status, bytes).into_response();
    copy_headers(response.headers_mut(), &headers);
    mark(&mut response, "MISS");
    Ok(response)
}

/// Path and query of the request, e.g. `/search?q=rust`.
pub fn cache_key(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Origin URL with the request's path and query.
///
/// Only path and query are taken from the request, so the scheme and host
/// always stay the origin's.
pub fn upstream_url(origin: &Url, uri: &Uri) -> Url {
    let mut url = origin.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());
    url
}

/// Copies end-to-end headers, keeping repeated values.
///
/// A copied header replaces any value `target` already had for that name.
/// Hop-by-hop headers, including any named in `Connection`, and
/// `content-length` are dropped; the outgoing body sets its own framing.
pub fn copy_headers(target: &mut HeaderMap, source: &HeaderMap) {
    let listed = connection_listed(source);
    for name in source.keys() {
        if is_hop_by_hop(name)
            || *name == header::CONTENT_LENGTH
            || listed.iter().any(|l| l == name.as_str())
        {
            continue;
        }
        target.remove(name);
        for value in source.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Header names a sender marked as hop-by-hop through `Connection`.
fn connection_listed(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn mark(response: &mut Response, status: &'static str) {
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_query() {
        let request = axum::http::Request::builder()
            .uri("http://proxy.local/search?q=rust&page=2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(cache_key(&request), "/search?q=rust&page=2");
    }

    #[test]
    fn test_cache_key_ignores_method() {
        let get = axum::http::Request::builder()
            .uri("/a")
            .body(Body::empty())
            .unwrap();
        let post = axum::http::Request::builder()
            .method("POST")
            .uri("/a")
            .body(Body::empty())
            .unwrap();
        assert_eq!(cache_key(&get), cache_key(&post));
    }

    #[test]
    fn test_upstream_url_replaces_path_and_query() {
        let origin = Url::parse("http://origin.local:8080/ignored?x=1").unwrap();
        let uri: Uri = "/items?id=3".parse().unwrap();
        let url = upstream_url(&origin, &uri);
        assert_eq!(url.as_str(), "http://origin.local:8080/items?id=3");
    }

    #[test]
    fn test_upstream_url_keeps_origin_host() {
        let origin = Url::parse("https://origin.local").unwrap();
        let uri: Uri = "//elsewhere.example/x".parse().unwrap();
        let url = upstream_url(&origin, &uri);
        assert_eq!(url.host_str(), Some("origin.local"));
    }

    #[test]
    fn test_copy_headers_replaces_existing_value() {
        let mut source = HeaderMap::new();
        source.insert("content-type", HeaderValue::from_static("text/html"));

        let mut target = HeaderMap::new();
        target.insert("content-type", HeaderValue::from_static("application/octet-stream"));
        copy_headers(&mut target, &source);

        assert_eq!(target.get_all("content-type").iter().count(), 1);
        assert_eq!(target["content-type"], "text/html");
    }

    #[test]
    fn test_copy_headers_skips_hop_by_hop() {
        let mut source = HeaderMap::new();
        source.insert("connection", HeaderValue::from_static("keep-alive"));
        source.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        source.insert("content-length", HeaderValue::from_static("12"));
        source.append("set-cookie", HeaderValue::from_static("a=1"));
        source.append("set-cookie", HeaderValue::from_static("b=2"));
        source.insert("content-type", HeaderValue::from_static("text/plain"));

        let mut target = HeaderMap::new();
        copy_headers(&mut target, &source);

        assert!(target.get("connection").is_none());
        assert!(target.get("transfer-encoding").is_none());
        assert!(target.get("content-length").is_none());
        assert_eq!(target.get_all("set-cookie").iter().count(), 2);
        assert_eq!(target["content-type"], "text/plain");
    }

    #[test]
    fn test_copy_headers_skips_connection_listed() {
        let mut source = HeaderMap::new();
        source.insert("connection", HeaderValue::from_static("X-Session-Hint, keep-alive"));
        source.append("connection", HeaderValue::from_static("x-trace-hop"));
        source.insert("x-session-hint", HeaderValue::from_static("abc"));
        source.insert("x-trace-hop", HeaderValue::from_static("1"));
        source.insert("x-request-id", HeaderValue::from_static("42"));

        let mut target = HeaderMap::new();
        copy_headers(&mut target, &source);

        assert!(target.get("x-session-hint").is_none());
        assert!(target.get("x-trace-hop").is_none());
        assert_eq!(target["x-request-id"], "42");
    }
}
