//! Health check handler.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Health check handler.
///
/// The gate has no persistent dependencies; liveness is reported together
/// with the imported-key cache size for operational visibility.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "gate_id": "eg-host-1a2b3c4d",
///   "keys_cached": 1
/// }
/// ```
#[instrument(skip_all, name = "eg.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let keys_cached = state.key_store.cached_key_count().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        gate_id: state.config.gate_id.clone(),
        keys_cached,
    })
}
