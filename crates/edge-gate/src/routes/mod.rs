//! HTTP routes for the Edge Gate.
//!
//! Defines the Axum router and application state.

use crate::auth::KeyStore;
use crate::config::Config;
use crate::gate::Gate;
use crate::handlers;
use axum::routing::{any, get};
use axum::Router;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// The decision engine.
    pub gate: Arc<Gate>,

    /// The injected key resolver/cache (shared with the gate).
    pub key_store: Arc<KeyStore>,
}

/// Install the Prometheus metrics recorder.
///
/// Call once at startup, before any metric is recorded.
///
/// # Errors
///
/// Returns `BuildError` if a global recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/v1/health` - Liveness and key-cache visibility
/// - `/v1/authorize` - Forward-auth gate endpoint (any method)
/// - `/metrics` - Prometheus scrape endpoint
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let service_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route("/v1/authorize", any(handlers::authorize))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    service_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
