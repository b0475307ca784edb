//! Edge Gate models.
//!
//! Data types returned by the operational endpoints.

use serde::{Deserialize, Serialize};

/// Health check response.
///
/// Returned by the `/v1/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy").
    pub status: String,

    /// This gate instance's identifier.
    pub gate_id: String,

    /// Number of verification keys imported and cached so far.
    pub keys_cached: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            gate_id: "eg-test-01".to_string(),
            keys_cached: 2,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["gate_id"], "eg-test-01");
        assert_eq!(json["keys_cached"], 2);
    }
}
