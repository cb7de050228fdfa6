//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced by the cache engine.
///
/// A lookup miss is not an error; `CacheClient::check` returns `None` for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache was stopped, or its actor loop has exited
    #[error("cache closed")]
    Closed,

    /// `run` was called while the actor loop was already taken
    #[error("cache actor is already running")]
    AlreadyRunning,

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Proxy Error Enum ==
/// Errors raised while forwarding a request to the origin.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The origin could not be reached or answered with a broken response
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The inbound request body could not be read
    #[error("Failed to read request body: {0}")]
    Body(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Every forwarding failure is reported as a 500, like a failed round trip.
        let body = Json(json!({
            "error": self.to_string()
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
