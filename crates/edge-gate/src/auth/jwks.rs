//! Key-set sources and the per-process key resolver/cache.
//!
//! The key set either arrives as a static document supplied at deploy time
//! or is fetched lazily from the provider's key-set endpoint. Fetching
//! happens at most once per process: the document and every imported key
//! are cached for the remaining life of the execution instance, with no
//! eviction. Staleness is bounded only by instance recycling, which is
//! acceptable because provider key rotation overlaps kids in the published
//! set.
//!
//! # Security
//!
//! - Lookup is by exact kid; absence is a hard failure, never a fallback
//!   to a default or first key
//! - Imported keys are verify-only decoding keys

use crate::config::{Config, ConfigError};
use crate::errors::DenyReason;
use crate::observability::metrics::record_keyset_fetch;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

/// Timeout for key-set endpoint fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key from a key-set document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "RSA" for RS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm (should be "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// Key-set document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Where the key set comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// A document supplied at deploy time; never fetched.
    Static(JwkSet),

    /// A provider endpoint, fetched at most once per process.
    Endpoint(String),
}

impl KeySource {
    /// Derive the key source from configuration.
    ///
    /// An inline document takes precedence over the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKeySet` if the inline document does not
    /// parse as a key set.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match &config.jwks_inline {
            Some(document) => {
                let set: JwkSet = serde_json::from_str(document)
                    .map_err(|e| ConfigError::InvalidKeySet(e.to_string()))?;
                Ok(KeySource::Static(set))
            }
            None => Ok(KeySource::Endpoint(config.jwks_url.clone())),
        }
    }
}

/// Per-process key resolver and cache.
///
/// Explicitly constructed and injectable so tests can supply isolated
/// instances. Read-mostly after first population; concurrent readers share
/// the locks without contention in the steady state.
pub struct KeyStore {
    source: KeySource,

    /// HTTP client for endpoint fetches.
    http_client: reqwest::Client,

    /// The loaded key-set document, indexed by kid. Populated once.
    raw: RwLock<Option<HashMap<String, Jwk>>>,

    /// Imported verify-only keys, by kid. Grows monotonically.
    imported: RwLock<HashMap<String, Arc<DecodingKey>>>,
}

impl KeyStore {
    /// Create a key store over the given source.
    ///
    /// A static source is indexed immediately; an endpoint source is
    /// fetched on first use.
    #[must_use]
    pub fn new(source: KeySource) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "eg.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        let raw = match &source {
            KeySource::Static(set) => Some(index_keys(set.clone())),
            KeySource::Endpoint(_) => None,
        };

        Self {
            source,
            http_client,
            raw: RwLock::new(raw),
            imported: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a kid to an imported verification key.
    ///
    /// # Errors
    ///
    /// Returns `DenyReason::KeyNotFound` when the kid is absent from the
    /// key set, the key material is unusable, or the key set cannot be
    /// fetched. Callers never learn which; the cause is logged.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, DenyReason> {
        {
            let imported = self.imported.read().await;
            if let Some(key) = imported.get(kid) {
                tracing::debug!(target: "eg.auth.jwks", kid = %kid, "Imported key cache hit");
                return Ok(Arc::clone(key));
            }
        }

        self.ensure_loaded().await?;

        let jwk = {
            let raw = self.raw.read().await;
            let keys = raw.as_ref().ok_or(DenyReason::KeyNotFound)?;
            match keys.get(kid) {
                Some(jwk) => jwk.clone(),
                None => {
                    tracing::warn!(target: "eg.auth.jwks", kid = %kid, "Key not found in key set");
                    return Err(DenyReason::KeyNotFound);
                }
            }
        };

        let key = Arc::new(import_key(&jwk)?);

        let mut imported = self.imported.write().await;
        let entry = imported
            .entry(kid.to_string())
            .or_insert_with(|| Arc::clone(&key));
        Ok(Arc::clone(entry))
    }

    /// Number of imported keys currently cached.
    pub async fn cached_key_count(&self) -> usize {
        self.imported.read().await.len()
    }

    /// Load the key-set document if it has not been loaded yet.
    async fn ensure_loaded(&self) -> Result<(), DenyReason> {
        if self.raw.read().await.is_some() {
            return Ok(());
        }

        let set = self.fetch_key_set().await?;

        let mut raw = self.raw.write().await;
        // Populate once: a concurrent first request may have won the race.
        if raw.is_none() {
            *raw = Some(index_keys(set));
        }
        Ok(())
    }

    /// Fetch the key-set document from the provider endpoint.
    ///
    /// A failure caches nothing, so a later request triggers a fresh fetch.
    async fn fetch_key_set(&self) -> Result<JwkSet, DenyReason> {
        let url = match &self.source {
            KeySource::Static(set) => return Ok(set.clone()),
            KeySource::Endpoint(url) => url,
        };

        tracing::debug!(target: "eg.auth.jwks", url = %url, "Fetching key set");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::warn!(target: "eg.auth.jwks", error = %e, "Failed to fetch key set");
            record_keyset_fetch("error");
            DenyReason::KeyNotFound
        })?;

        if !response.status().is_success() {
            tracing::warn!(
                target: "eg.auth.jwks",
                status = %response.status(),
                "Key-set endpoint returned error"
            );
            record_keyset_fetch("error");
            return Err(DenyReason::KeyNotFound);
        }

        let set: JwkSet = response.json().await.map_err(|e| {
            tracing::warn!(target: "eg.auth.jwks", error = %e, "Failed to parse key-set response");
            record_keyset_fetch("error");
            DenyReason::KeyNotFound
        })?;

        record_keyset_fetch("ok");
        tracing::info!(
            target: "eg.auth.jwks",
            key_count = set.keys.len(),
            "Key set loaded"
        );

        Ok(set)
    }
}

/// Index a key set by kid.
fn index_keys(set: JwkSet) -> HashMap<String, Jwk> {
    set.keys
        .into_iter()
        .map(|key| (key.kid.clone(), key))
        .collect()
}

/// Import a JWK into a verify-only decoding key.
fn import_key(jwk: &Jwk) -> Result<DecodingKey, DenyReason> {
    let (n, e) = match (&jwk.n, &jwk.e) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            tracing::warn!(target: "eg.auth.jwks", kid = %jwk.kid, "JWK missing RSA components");
            return Err(DenyReason::KeyNotFound);
        }
    };

    DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::warn!(target: "eg.auth.jwks", kid = %jwk.kid, error = %e, "Failed to import key");
        DenyReason::KeyNotFound
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn test_set() -> JwkSet {
        serde_json::from_value(serde_json::json!({
            "keys": [
                {
                    "kty": "RSA",
                    "kid": "test-key-01",
                    "n": "uqaRMwxdRCcGCIAHa5qKUI9sNgQxGitBwZUbkyWIpFaJsJatlkNLich06ybH22yg",
                    "e": "AQAB",
                    "alg": "RS256",
                    "use": "sig"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_jwk_deserialization() {
        let json = r#"{
            "kty": "RSA",
            "kid": "key-1",
            "n": "dGVzdC1tb2R1bHVz",
            "e": "AQAB",
            "alg": "RS256",
            "use": "sig"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "key-1");
        assert_eq!(jwk.n.as_deref(), Some("dGVzdC1tb2R1bHVz"));
        assert_eq!(jwk.e.as_deref(), Some("AQAB"));
        assert_eq!(jwk.alg.as_deref(), Some("RS256"));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
    }

    #[test]
    fn test_jwk_deserialization_minimal() {
        let json = r#"{"kty": "RSA", "kid": "key-2"}"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kid, "key-2");
        assert!(jwk.n.is_none());
        assert!(jwk.e.is_none());
    }

    #[tokio::test]
    async fn test_static_store_resolves_known_kid() {
        let store = KeyStore::new(KeySource::Static(test_set()));

        let key = store.resolve("test-key-01").await;
        assert!(key.is_ok());
        assert_eq!(store.cached_key_count().await, 1);
    }

    #[tokio::test]
    async fn test_static_store_rejects_unknown_kid() {
        let store = KeyStore::new(KeySource::Static(test_set()));

        // A single configured key must never act as a default.
        let result = store.resolve("some-other-kid").await;
        assert!(matches!(result, Err(DenyReason::KeyNotFound)));
        assert_eq!(store.cached_key_count().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_caches_imported_key() {
        let store = KeyStore::new(KeySource::Static(test_set()));

        let first = store.resolve("test-key-01").await.unwrap();
        let second = store.resolve("test-key-01").await.unwrap();

        assert!(
            Arc::ptr_eq(&first, &second),
            "second resolve should hit the imported-key cache"
        );
    }

    #[tokio::test]
    async fn test_jwk_without_components_is_unusable() {
        let set: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [{"kty": "RSA", "kid": "partial-key"}]
        }))
        .unwrap();
        let store = KeyStore::new(KeySource::Static(set));

        let result = store.resolve("partial-key").await;
        assert!(matches!(result, Err(DenyReason::KeyNotFound)));
    }

    #[test]
    fn test_key_source_from_config_prefers_inline() {
        let mut vars = std::collections::HashMap::from([
            (
                "IDP_ISSUER_URL".to_string(),
                "https://idp.example.com".to_string(),
            ),
            ("IDP_AUDIENCE".to_string(), "client".to_string()),
            ("REJECT_MODE".to_string(), "unauthorized".to_string()),
        ]);
        vars.insert(
            "JWKS_INLINE".to_string(),
            r#"{"keys":[{"kty":"RSA","kid":"inline-key"}]}"#.to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        let source = KeySource::from_config(&config).unwrap();

        match source {
            KeySource::Static(set) => {
                assert_eq!(set.keys.len(), 1);
                assert_eq!(set.keys.first().unwrap().kid, "inline-key");
            }
            KeySource::Endpoint(_) => panic!("expected static source"),
        }
    }

    #[test]
    fn test_key_source_from_config_rejects_bad_inline() {
        let vars = std::collections::HashMap::from([
            (
                "IDP_ISSUER_URL".to_string(),
                "https://idp.example.com".to_string(),
            ),
            ("IDP_AUDIENCE".to_string(), "client".to_string()),
            ("REJECT_MODE".to_string(), "unauthorized".to_string()),
            ("JWKS_INLINE".to_string(), "not-json".to_string()),
        ]);

        let config = Config::from_vars(&vars).unwrap();
        let result = KeySource::from_config(&config);
        assert!(matches!(result, Err(ConfigError::InvalidKeySet(_))));
    }

    #[test]
    fn test_key_source_from_config_falls_back_to_endpoint() {
        let vars = std::collections::HashMap::from([
            (
                "IDP_ISSUER_URL".to_string(),
                "https://idp.example.com".to_string(),
            ),
            ("IDP_AUDIENCE".to_string(), "client".to_string()),
            ("REJECT_MODE".to_string(), "unauthorized".to_string()),
        ]);

        let config = Config::from_vars(&vars).unwrap();
        let source = KeySource::from_config(&config).unwrap();

        match source {
            KeySource::Endpoint(url) => {
                assert_eq!(url, "https://idp.example.com/.well-known/jwks.json");
            }
            KeySource::Static(_) => panic!("expected endpoint source"),
        }
    }
}
