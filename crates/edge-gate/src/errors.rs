//! Deny reasons for rejected requests.
//!
//! Every way the gate can refuse a request is a member of one closed
//! taxonomy. The `Display` message is the same generic sentence for every
//! variant: the specific reason exists for server-side diagnostics and
//! metrics only, and must never vary the client-visible response, so that
//! error specificity cannot be used as an oracle.

use thiserror::Error;

/// Reason a request was rejected by the gate.
///
/// The variant is logged and counted server-side; clients always observe
/// the same response shape for the deployment's configured mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No `Authorization` header, or an empty one.
    #[error("the request did not carry a valid access token")]
    MissingAuthHeader,

    /// Token is not three non-empty base64url segments of valid JSON,
    /// or exceeds the size bound, or the bearer scheme is absent.
    #[error("the request did not carry a valid access token")]
    MalformedToken,

    /// Token header carries no usable `kid`.
    #[error("the request did not carry a valid access token")]
    MissingKid,

    /// No key in the configured key set matches the token's `kid`.
    #[error("the request did not carry a valid access token")]
    KeyNotFound,

    /// Signature verification failed, for any reason.
    #[error("the request did not carry a valid access token")]
    SignatureInvalid,

    /// `iss` or `aud` does not exactly match the configured values.
    #[error("the request did not carry a valid access token")]
    IssuerOrAudienceMismatch,

    /// `exp` is not strictly in the future.
    #[error("the request did not carry a valid access token")]
    Expired,
}

impl DenyReason {
    /// Stable label for logs and bounded-cardinality metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MissingAuthHeader => "missing_auth_header",
            DenyReason::MalformedToken => "malformed_token",
            DenyReason::MissingKid => "missing_kid",
            DenyReason::KeyNotFound => "key_not_found",
            DenyReason::SignatureInvalid => "signature_invalid",
            DenyReason::IssuerOrAudienceMismatch => "issuer_or_audience_mismatch",
            DenyReason::Expired => "expired",
        }
    }
}
