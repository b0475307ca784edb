//! Validated request/response boundary types.
//!
//! The gate never operates on loosely-typed header maps from the host
//! runtime. Inbound requests are first narrowed to a [`ViewerRequest`],
//! the explicit description the decision engine consumes, and rejections
//! are synthesized centrally so every deny reason renders the exact same
//! response shape for the configured mode.

use crate::config::RejectMode;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Fixed plaintext body for unauthorized-mode rejections.
///
/// Deliberately constant: the body never varies with the deny reason.
pub const UNAUTHORIZED_BODY: &str = "Unauthorized: a valid bearer token is required";

/// Bearer challenge sent on unauthorized-mode rejections.
pub const BEARER_CHALLENGE: &str = "Bearer realm=\"edge-gate\", error=\"invalid_token\"";

/// Description of an inbound request as seen at the edge.
///
/// Bodies are never read: the gate decides on headers alone, and an
/// accepted request passes through byte-identical.
#[derive(Debug, Clone)]
pub struct ViewerRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
}

impl ViewerRequest {
    /// Build a request description from its parts.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The `Authorization` header value, if present and readable as text.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }
}

impl<B> From<&axum::http::Request<B>> for ViewerRequest {
    fn from(request: &axum::http::Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request.uri().path(),
            request.headers().clone(),
        )
    }
}

/// Synthesize the rejection response for the configured mode.
///
/// The response shape depends only on the mode, never on why the request
/// was denied:
///
/// - [`RejectMode::Redirect`]: 302 with `Location` set to the hosted-login
///   URL.
/// - [`RejectMode::Unauthorized`]: 401 with a `WWW-Authenticate` bearer
///   challenge and a fixed plaintext body.
#[must_use]
pub fn rejection_response(mode: RejectMode, login_url: Option<&str>) -> Response {
    match mode {
        RejectMode::Redirect => {
            let mut response = StatusCode::FOUND.into_response();
            // Config validation guarantees a header-safe login URL in
            // redirect mode; the fallback is a bare 302.
            if let Some(url) = login_url {
                if let Ok(value) = HeaderValue::from_str(url) {
                    response.headers_mut().insert(header::LOCATION, value);
                }
            }
            response
        }
        RejectMode::Unauthorized => {
            let mut response = (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response();
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_CHALLENGE),
            );
            response
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_authorization_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc"),
        );
        let request = ViewerRequest::new(Method::GET, "/resource", headers);

        assert_eq!(request.authorization(), Some("Bearer abc"));
        assert_eq!(request.path(), "/resource");
        assert_eq!(request.method(), &Method::GET);
    }

    #[test]
    fn test_authorization_absent() {
        let request = ViewerRequest::new(Method::GET, "/resource", HeaderMap::new());
        assert!(request.authorization().is_none());
    }

    #[test]
    fn test_from_http_request_borrows_headers() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("https://example.com/a/b?q=1")
            .header("authorization", "Bearer t")
            .body(())
            .unwrap();

        let view = ViewerRequest::from(&request);
        assert_eq!(view.method(), &Method::POST);
        assert_eq!(view.path(), "/a/b");
        assert_eq!(view.authorization(), Some("Bearer t"));
    }

    #[test]
    fn test_redirect_rejection_shape() {
        let response = rejection_response(
            RejectMode::Redirect,
            Some("https://app.example.com/login"),
        );

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://app.example.com/login"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_rejection_shape() {
        let response = rejection_response(RejectMode::Unauthorized, None);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .expect("challenge header present")
            .to_str()
            .unwrap();
        assert!(www_auth.starts_with("Bearer realm="));
        assert!(www_auth.contains("error=\"invalid_token\""));

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type present")
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/plain"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, UNAUTHORIZED_BODY.as_bytes());
    }
}
