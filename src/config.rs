//! Configuration Module
//!
//! Command-line flags, each with an environment variable fallback.

use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::cache::{CacheConfig, CacheStrategy};
use crate::error::{CacheError, Result};

/// Proxy configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "caching_proxy", version, about = "Caching forward HTTP proxy")]
pub struct Config {
    /// Port the proxy listens on
    #[arg(long, env = "PROXY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Origin every request is forwarded to (http:// or https://)
    #[arg(long, env = "PROXY_ORIGIN")]
    pub origin: String,

    /// Maximum number of cached responses
    #[arg(long, env = "CACHE_CAPACITY", default_value_t = 100)]
    pub capacity: usize,

    /// Eviction strategy: fifo, lru or lfu (unknown values fall back to fifo)
    #[arg(long, env = "CACHE_STRATEGY", default_value = "fifo")]
    pub strategy: String,

    /// Seconds between single-entry staleness sweeps
    #[arg(long, env = "CACHE_SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    /// Cache mutations queued before request handlers wait
    #[arg(long, env = "CACHE_MAILBOX_SIZE", default_value_t = 32)]
    pub mailbox_size: usize,
}

impl Config {
    /// Checks the origin and returns the validated cache configuration.
    pub fn validate(&self) -> Result<CacheConfig> {
        self.origin_url()?;
        let cache = self.cache_config();
        cache.validate()?;
        Ok(cache)
    }

    // == Origin ==
    /// Parses the origin, which must carry an http or https scheme.
    pub fn origin_url(&self) -> Result<Url> {
        if !has_http_scheme(&self.origin) {
            return Err(CacheError::InvalidConfig(format!(
                "origin needs an http:// or https:// scheme, got '{}'",
                self.origin
            )));
        }

        Url::parse(&self.origin).map_err(|e| {
            CacheError::InvalidConfig(format!("failed to parse origin '{}': {}", self.origin, e))
        })
    }

    // == Cache Config ==
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            strategy: CacheStrategy::parse_lossy(&self.strategy),
            capacity: self.capacity,
            sweep_interval: Duration::from_secs(self.sweep_interval),
            mailbox_size: self.mailbox_size,
        }
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
