//! Signature verification and trust-claim validation.
//!
//! # Security
//!
//! - The verified message is the original `header.payload` byte string,
//!   never a re-serialization of decoded JSON
//! - Only RS256 (RSASSA-PKCS1-v1_5 / SHA-256) is accepted; a token claiming
//!   any other algorithm fails verification
//! - Every signature failure collapses to one reason; the verifier never
//!   reveals why a signature did not check out

use crate::auth::claims::TokenClaims;
use crate::errors::DenyReason;
use jsonwebtoken::{crypto, Algorithm, DecodingKey};

/// The configured trust scope tokens must match exactly.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    /// Expected `iss` value.
    pub issuer: String,

    /// Expected `aud` value.
    pub audience: String,
}

/// Verify an RS256 signature over the original signed message.
///
/// `signature` is the base64url signature segment as it appeared in the
/// token; `message` is the `header.payload` byte string.
///
/// # Errors
///
/// Returns `DenyReason::SignatureInvalid` uniformly: bad signature, wrong
/// key, tampered message, and undecodable signature bytes are externally
/// indistinguishable.
pub fn verify_signature(
    message: &[u8],
    signature: &str,
    key: &DecodingKey,
) -> Result<(), DenyReason> {
    match crypto::verify(signature, message, key, Algorithm::RS256) {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(target: "eg.auth.verify", "Signature verification failed");
            Err(DenyReason::SignatureInvalid)
        }
        Err(e) => {
            tracing::debug!(target: "eg.auth.verify", error = %e, "Signature verification errored");
            Err(DenyReason::SignatureInvalid)
        }
    }
}

/// Validate trust claims against the configured anchor.
///
/// Runs only after the signature has verified. Issuer and audience must
/// match byte-exact; `exp`, when present, must be strictly in the future.
///
/// # Errors
///
/// Returns `DenyReason::IssuerOrAudienceMismatch` or `DenyReason::Expired`.
pub fn validate_claims(claims: &TokenClaims, trust: &TrustAnchor) -> Result<(), DenyReason> {
    validate_claims_at(claims, trust, chrono::Utc::now().timestamp())
}

/// Deterministic claim validation against an explicit `now` timestamp.
///
/// Prefer [`validate_claims`] in production code. This variant exists so
/// that boundary conditions can be unit-tested without wall-clock
/// dependence.
pub(crate) fn validate_claims_at(
    claims: &TokenClaims,
    trust: &TrustAnchor,
    now: i64,
) -> Result<(), DenyReason> {
    if claims.iss.as_deref() != Some(trust.issuer.as_str())
        || claims.aud.as_deref() != Some(trust.audience.as_str())
    {
        tracing::debug!(
            target: "eg.auth.verify",
            iss = claims.iss.as_deref().unwrap_or("<absent>"),
            aud = claims.aud.as_deref().unwrap_or("<absent>"),
            "Token rejected: issuer or audience mismatch"
        );
        return Err(DenyReason::IssuerOrAudienceMismatch);
    }

    if let Some(exp) = claims.exp {
        if exp <= now {
            tracing::debug!(
                target: "eg.auth.verify",
                exp = exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(DenyReason::Expired);
        }
    }

    Ok(())
}
