//! Proxy Routes
//!
//! Configures the Axum router that sends every request through the proxy.

use axum::Router;
use tower_http::trace::TraceLayer;

use super::handler::{proxy_handler, ProxyState};

/// Creates the proxy router.
///
/// There are no fixed routes: any method on any path reaches
/// `proxy_handler`.
///
/// # Middleware
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: ProxyState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
