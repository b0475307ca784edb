//! Test server harness.
//!
//! Spawns a real Edge Gate on an ephemeral port, wired to a wiremock
//! key-set endpoint, plus a protected origin-simulation route behind the
//! gate middleware so tests can observe exactly what an accepted request
//! looks like on the far side.

use crate::{jwks_document, TokenBuilder, TEST_AUDIENCE, TEST_LOGIN_URL};
use anyhow::Result;
use axum::extract::Request;
use axum::routing::any;
use axum::{Json, Router};
use edge_gate::auth::{KeySource, KeyStore};
use edge_gate::config::Config;
use edge_gate::gate::Gate;
use edge_gate::middleware::{require_auth, AuthState};
use edge_gate::routes::{self, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mocked provider serves its key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Global metrics handle for test servers.
///
/// A Prometheus recorder can only be installed once per process; later
/// servers fall back to a detached recorder handle.
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            routes::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// A running Edge Gate with a mocked provider key-set endpoint.
pub struct TestGateServer {
    addr: SocketAddr,
    /// The mocked identity provider; its URI is the trusted issuer.
    pub mock_server: MockServer,
    _server_handle: JoinHandle<()>,
    issuer: String,
}

impl TestGateServer {
    /// Spawn a redirect-mode gate serving the standard test key set.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(&[], None).await
    }

    /// Spawn a gate with extra configuration variables and an optional
    /// replacement key-set document.
    ///
    /// The mocked provider's URI is installed as `IDP_ISSUER_URL`, so the
    /// derived key-set endpoint points back at the mock.
    pub async fn spawn_with(
        extra_vars: &[(&str, &str)],
        jwks: Option<Value>,
    ) -> Result<Self> {
        let mock_server = MockServer::start().await;

        let jwks_response = jwks.unwrap_or_else(jwks_document);
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks_response))
            .mount(&mock_server)
            .await;

        let issuer = mock_server.uri();

        let mut vars = HashMap::from([
            ("IDP_ISSUER_URL".to_string(), issuer.clone()),
            ("IDP_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("LOGIN_URL".to_string(), TEST_LOGIN_URL.to_string()),
            ("GATE_ID".to_string(), "eg-test-01".to_string()),
        ]);
        for (key, value) in extra_vars {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let key_source = KeySource::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to resolve key source: {}", e))?;
        let key_store = Arc::new(KeyStore::new(key_source));
        let gate = Arc::new(Gate::new(&config, Arc::clone(&key_store)));

        let state = Arc::new(AppState {
            config,
            gate: Arc::clone(&gate),
            key_store,
        });

        // Origin simulation: a route that only exists behind the gate
        // middleware and echoes what it received.
        let auth_state = Arc::new(AuthState { gate });
        let protected = Router::new()
            .route("/origin/echo", any(echo))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                require_auth,
            ));

        let app = routes::build_routes(state, get_test_metrics_handle()).merge(protected);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            mock_server,
            _server_handle: server_handle,
            issuer,
        })
    }

    /// Base URL of the running gate.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The issuer this gate trusts (the mocked provider's URI).
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// A token builder preconfigured for this gate's trust scope.
    #[must_use]
    pub fn token(&self) -> TokenBuilder {
        TokenBuilder::new(&self.issuer, TEST_AUDIENCE)
    }

    /// Replace the mocked key-set response.
    pub async fn reset_jwks(&self, jwks: Value) {
        self.mock_server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks))
            .mount(&self.mock_server)
            .await;
    }

    /// Make the key-set endpoint fail with the given status.
    pub async fn fail_jwks(&self, status: u16) {
        self.mock_server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Number of key-set fetches the mocked provider has served.
    pub async fn jwks_fetch_count(&self) -> usize {
        self.mock_server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

impl Drop for TestGateServer {
    fn drop(&mut self) {
        self._server_handle.abort();
    }
}

/// Echo handler standing in for the origin.
///
/// Reports the request as received so tests can assert the gate forwarded
/// it unmodified.
async fn echo(req: Request) -> Json<Value> {
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok());

    Json(json!({
        "method": req.method().as_str(),
        "path": req.uri().path(),
        "authorization": authorization,
    }))
}
