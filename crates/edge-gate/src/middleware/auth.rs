//! Gate middleware for protected routes.
//!
//! Narrows the inbound request to a [`ViewerRequest`] description,
//! evaluates the gate, and either forwards the untouched original request
//! or answers with the deployment's configured rejection. Nothing is
//! inserted into the request on acceptance: the origin receives exactly
//! what the client sent.

use crate::event::ViewerRequest;
use crate::gate::{Decision, Gate};
use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::instrument;

/// State for the gate middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The shared decision engine.
    pub gate: Arc<Gate>,
}

/// Gate middleware that validates bearer tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - Continues to the next handler with the request unmodified if the
///   token is valid
/// - Returns the configured rejection (302 redirect or 401 challenge)
///   otherwise
#[instrument(skip(state, req, next), name = "eg.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    req: Request,
    next: Next,
) -> Response {
    let view = ViewerRequest::from(&req);

    match state.gate.evaluate(&view).await {
        Decision::Accept => next.run(req).await,
        Decision::Reject(_) => state.gate.rejection(),
    }
}
