//! Token decoding, key resolution, and verification.
//!
//! # Components
//!
//! - `claims` - Decoded header and payload structures (untrusted until
//!   verification succeeds)
//! - `decode` - Compact-token splitting and base64url/JSON decoding
//! - `jwks` - Key-set sources and the per-process key resolver/cache
//! - `verifier` - RS256 signature verification and trust-claim validation

pub mod claims;
pub mod decode;
pub mod jwks;
pub mod verifier;

pub use claims::{TokenClaims, TokenHeader};
pub use decode::{decode_token, DecodedToken};
pub use jwks::{KeySource, KeyStore};
pub use verifier::{validate_claims, verify_signature, TrustAnchor};
