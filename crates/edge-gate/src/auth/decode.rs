//! Compact-token splitting and decoding.
//!
//! This stage establishes no trust: it only turns an untrusted compact
//! token into candidate header/payload structures, preserving the exact
//! `header.payload` byte string for the signature verifier.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any decoding (DoS prevention)
//! - The signed message is borrowed from the original token, never
//!   re-serialized from decoded JSON

use crate::auth::claims::{TokenClaims, TokenHeader};
use crate::errors::DenyReason;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;

/// Maximum allowed token size in bytes (8KB).
///
/// Typical access tokens are well under 2KB; anything larger is rejected
/// before base64 decoding or JSON parsing runs.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// A compact token split into its three segments.
///
/// `message` is the `header.payload` slice of the original input,
/// byte-for-byte: exactly what the signature covers.
#[derive(Debug, Clone, Copy)]
pub struct RawToken<'t> {
    /// The signed `header.payload` byte string.
    pub message: &'t str,

    /// Base64url header segment.
    pub header: &'t str,

    /// Base64url payload segment.
    pub payload: &'t str,

    /// Base64url signature segment.
    pub signature: &'t str,
}

/// A decoded (but unverified) token.
#[derive(Debug, Clone)]
pub struct DecodedToken<'t> {
    /// Decoded header - untrusted.
    pub header: TokenHeader,

    /// Decoded payload - untrusted.
    pub claims: TokenClaims,

    /// The signed `header.payload` byte string from the original token.
    pub message: &'t str,

    /// Base64url signature segment.
    pub signature: &'t str,
}

/// Split a compact token into exactly three non-empty segments.
///
/// # Errors
///
/// Returns `DenyReason::MalformedToken` for any other shape, including
/// oversized tokens.
pub fn split_token(token: &str) -> Result<RawToken<'_>, DenyReason> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "eg.auth.token",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(DenyReason::MalformedToken);
    }

    let (message, signature) = token.rsplit_once('.').ok_or(DenyReason::MalformedToken)?;
    let (header, payload) = message.split_once('.').ok_or(DenyReason::MalformedToken)?;

    // Exactly three segments, all non-empty.
    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        tracing::debug!(target: "eg.auth.token", "Token rejected: invalid segment structure");
        return Err(DenyReason::MalformedToken);
    }

    Ok(RawToken {
        message,
        header,
        payload,
        signature,
    })
}

/// Base64url-decode a segment and parse it as JSON.
fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, DenyReason> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "eg.auth.token", error = %e, "Failed to decode token segment base64");
        DenyReason::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "eg.auth.token", error = %e, "Failed to parse token segment JSON");
        DenyReason::MalformedToken
    })
}

/// Decode a compact token into candidate header/payload structures.
///
/// # Errors
///
/// Returns `DenyReason::MalformedToken` on any structural, base64, or JSON
/// failure. This function performs no trust decisions.
pub fn decode_token(token: &str) -> Result<DecodedToken<'_>, DenyReason> {
    let raw = split_token(token)?;
    let header: TokenHeader = decode_segment(raw.header)?;
    let claims: TokenClaims = decode_segment(raw.payload)?;

    Ok(DecodedToken {
        header,
        claims,
        message: raw.message,
        signature: raw.signature,
    })
}
