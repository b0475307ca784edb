//! Decoded token structures.
//!
//! Both structures are produced by decoding alone and are untrusted until
//! the signature verifies and the trust claims check out. The `sub` field
//! is redacted in Debug output to keep subject identifiers out of logs.

use serde::Deserialize;
use std::fmt;

/// Decoded JWT header.
///
/// Every field is optional at this stage; presence requirements (notably
/// `kid`) are enforced by the decision engine, not the decoder.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm the token claims to use.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key id selecting the verification key.
    #[serde(default)]
    pub kid: Option<String>,

    /// Token type, conventionally "JWT".
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decoded JWT payload.
///
/// Carries only the claims the gate evaluates; unknown claims are ignored
/// by deserialization.
#[derive(Clone, Deserialize)]
pub struct TokenClaims {
    /// Issuer URL.
    #[serde(default)]
    pub iss: Option<String>,

    /// Audience (client id).
    #[serde(default)]
    pub aud: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default)]
    pub exp: Option<i64>,

    /// Subject - redacted in Debug output.
    #[serde(default)]
    pub sub: Option<String>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default)]
    pub iat: Option<i64>,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("iat", &self.iat)
            .finish()
    }
}
