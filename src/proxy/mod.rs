//! Proxy Module
//!
//! Forwarding HTTP surface in front of the response cache.
//!
//! Every inbound request is answered from the cache when its path and query
//! were seen before, and forwarded to the configured origin otherwise.

pub mod handler;
pub mod routes;

pub use handler::{proxy_handler, ProxyState};
pub use routes::create_router;

/// Response header telling clients whether the cache answered
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Largest inbound request body forwarded to the origin (10 MB)
pub const MAX_REQUEST_BODY: usize = 10 * 1024 * 1024;
