//! Forward-auth authorization handler.
//!
//! The deployment surface for proxies and CDNs that consult an external
//! authorizer per request: the edge forwards the inbound request
//! description here, and a 204 answer means "forward to origin" while any
//! other answer is returned to the client verbatim. The request body is
//! never read.

use crate::event::ViewerRequest;
use crate::gate::Decision;
use crate::routes::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::instrument;

/// Handler for ANY /v1/authorize
///
/// Evaluates the gate against the forwarded request description.
///
/// # Response
///
/// - 204 No Content when the bearer token verifies ("forward to origin")
/// - The configured rejection (302 redirect or 401 challenge) otherwise
#[instrument(skip_all, name = "eg.authorize")]
pub async fn authorize(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let view = ViewerRequest::from(&req);

    match state.gate.evaluate(&view).await {
        Decision::Accept => StatusCode::NO_CONTENT.into_response(),
        Decision::Reject(_) => state.gate.rejection(),
    }
}
