//! The per-request decision engine.
//!
//! Evaluates one inbound request description into Accept (forward to
//! origin) or Reject, running the stages in a fixed order: header
//! presence, bearer prefix strip, decode, kid presence, key resolution,
//! signature verification, claim validation. The only suspension point is
//! the key-set fetch on a first-use cache miss.
//!
//! Accept never mutates the request. Reject short-circuits into the
//! deployment's configured response; the deny reason is logged and counted
//! but never shapes the response.

use crate::auth::{decode_token, validate_claims, verify_signature, KeyStore, TrustAnchor};
use crate::config::{Config, RejectMode};
use crate::errors::DenyReason;
use crate::event::{rejection_response, ViewerRequest};
use crate::observability::metrics::record_gate_decision;
use axum::response::Response;
use std::sync::Arc;
use tracing::instrument;

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the original request to the origin, unmodified.
    Accept,

    /// Short-circuit with the configured rejection response.
    Reject(DenyReason),
}

/// The request-time validation gate.
///
/// Stateless per request; the injected [`KeyStore`] is the only state
/// shared across requests.
pub struct Gate {
    key_store: Arc<KeyStore>,
    trust: TrustAnchor,
    reject_mode: RejectMode,
    login_url: Option<String>,
}

impl Gate {
    /// Build a gate from configuration and an injected key store.
    #[must_use]
    pub fn new(config: &Config, key_store: Arc<KeyStore>) -> Self {
        Self {
            key_store,
            trust: TrustAnchor {
                issuer: config.issuer_url.clone(),
                audience: config.audience.clone(),
            },
            reject_mode: config.reject_mode,
            login_url: config.login_url.clone(),
        }
    }

    /// Evaluate one request into a decision.
    ///
    /// Never fails: every error inside the verification path becomes a
    /// `Reject` with its reason.
    #[instrument(skip_all, name = "eg.gate.evaluate")]
    pub async fn evaluate(&self, request: &ViewerRequest) -> Decision {
        match self.check(request).await {
            Ok(()) => {
                tracing::debug!(target: "eg.gate", "Request accepted");
                record_gate_decision("accept", None);
                Decision::Accept
            }
            Err(reason) => {
                tracing::info!(
                    target: "eg.gate",
                    reason = reason.as_str(),
                    method = %request.method(),
                    path = %request.path(),
                    "Request rejected"
                );
                record_gate_decision("reject", Some(reason.as_str()));
                Decision::Reject(reason)
            }
        }
    }

    /// The fail-closed verification pipeline.
    async fn check(&self, request: &ViewerRequest) -> Result<(), DenyReason> {
        let header_value = request
            .authorization()
            .ok_or(DenyReason::MissingAuthHeader)?;
        if header_value.trim().is_empty() {
            return Err(DenyReason::MissingAuthHeader);
        }

        let token = strip_bearer(header_value).ok_or(DenyReason::MalformedToken)?;

        let decoded = decode_token(token)?;

        let kid = decoded
            .header
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(DenyReason::MissingKid)?;

        // The sole I/O-bound step; awaited to completion before verification.
        let key = self.key_store.resolve(kid).await?;

        verify_signature(decoded.message.as_bytes(), decoded.signature, &key)?;

        validate_claims(&decoded.claims, &self.trust)?;

        Ok(())
    }

    /// The rejection response for this deployment's mode.
    ///
    /// Identical for every deny reason.
    #[must_use]
    pub fn rejection(&self) -> Response {
        rejection_response(self.reject_mode, self.login_url.as_deref())
    }
}

/// Strip the bearer scheme, case-insensitively.
///
/// Returns `None` when the value does not use the bearer scheme.
fn strip_bearer(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(rest.trim_start())
    } else {
        None
    }
}
