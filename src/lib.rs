//! Caching Proxy - A forward HTTP proxy with a bounded response cache
//!
//! Responses fetched from the origin are kept in a FIFO cache whose
//! mutations are owned by a single actor task while lookups run concurrently.

pub mod cache;
pub mod config;
pub mod error;
pub mod proxy;

pub use cache::{CacheClient, CacheConfig};
pub use config::Config;
pub use proxy::{create_router, ProxyState};
