//! Edge Gate configuration.
//!
//! Configuration is loaded from environment variables. The gate holds no
//! secret material, only public trust anchors (issuer, audience) and the
//! public key-set source, so nothing here needs redaction.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Well-known path appended to the issuer URL to derive the key-set endpoint.
pub const JWKS_WELL_KNOWN_PATH: &str = "/.well-known/jwks.json";

/// Default gate instance ID prefix.
pub const DEFAULT_GATE_ID_PREFIX: &str = "eg";

/// How a rejected request is answered.
///
/// A deployment-time choice, never a per-token decision: every deny reason
/// renders the same response for the configured mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectMode {
    /// 302 redirect to the hosted-login URL.
    Redirect,

    /// 401 with a `WWW-Authenticate` bearer challenge.
    Unauthorized,
}

impl RejectMode {
    /// Stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectMode::Redirect => "redirect",
            RejectMode::Unauthorized => "unauthorized",
        }
    }
}

impl FromStr for RejectMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redirect" => Ok(RejectMode::Redirect),
            "unauthorized" => Ok(RejectMode::Unauthorized),
            other => Err(ConfigError::InvalidRejectMode(other.to_string())),
        }
    }
}

/// Edge Gate configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Trusted token issuer URL; tokens must carry this `iss` exactly.
    /// Also the base from which the key-set endpoint is derived.
    pub issuer_url: String,

    /// Trusted audience (client id); tokens must carry this `aud` exactly.
    pub audience: String,

    /// How rejected requests are answered.
    pub reject_mode: RejectMode,

    /// Hosted-login URL for redirect-mode rejections.
    pub login_url: Option<String>,

    /// Key-set endpoint. Defaults to `<issuer_url>/.well-known/jwks.json`.
    pub jwks_url: String,

    /// Statically supplied key-set document (JSON). When present, the
    /// endpoint is never fetched.
    pub jwks_inline: Option<String>,

    /// Unique identifier for this gate instance, used in logs.
    pub gate_id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid reject mode: {0} (expected \"redirect\" or \"unauthorized\")")]
    InvalidRejectMode(String),

    #[error("Redirect mode requires LOGIN_URL to be set")]
    MissingLoginUrl,

    #[error("Invalid login URL: {0}")]
    InvalidLoginUrl(String),

    #[error("Invalid inline key set: {0}")]
    InvalidKeySet(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let issuer_url = vars
            .get("IDP_ISSUER_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("IDP_ISSUER_URL".to_string()))?
            .clone();

        let audience = vars
            .get("IDP_AUDIENCE")
            .ok_or_else(|| ConfigError::MissingEnvVar("IDP_AUDIENCE".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let reject_mode = match vars.get("REJECT_MODE") {
            Some(value) => value.parse()?,
            None => RejectMode::Redirect,
        };

        let login_url = vars.get("LOGIN_URL").cloned();
        if reject_mode == RejectMode::Redirect {
            let url = login_url.as_deref().ok_or(ConfigError::MissingLoginUrl)?;
            // The URL must survive the trip into a Location header.
            if axum::http::HeaderValue::from_str(url).is_err() {
                return Err(ConfigError::InvalidLoginUrl(url.to_string()));
            }
        }

        let jwks_url = vars.get("JWKS_URL").cloned().unwrap_or_else(|| {
            format!(
                "{}{}",
                issuer_url.trim_end_matches('/'),
                JWKS_WELL_KNOWN_PATH
            )
        });

        let jwks_inline = vars.get("JWKS_INLINE").cloned();

        let gate_id = vars.get("GATE_ID").cloned().unwrap_or_else(|| {
            let hostname = env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{}-{}-{}", DEFAULT_GATE_ID_PREFIX, hostname, short_suffix)
        });

        Ok(Config {
            bind_address,
            issuer_url,
            audience,
            reject_mode,
            login_url,
            jwks_url,
            jwks_inline,
            gate_id,
        })
    }
}
