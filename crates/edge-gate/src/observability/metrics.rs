//! Metrics definitions for the Edge Gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `eg_` prefix for the Edge Gate
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: 2 values (accept, reject)
//! - `reason`: 8 values (the closed deny taxonomy, plus "none")
//! - `result`: 2 values (ok, error)

use metrics::counter;

/// Record one gate decision.
///
/// Metric: `eg_gate_decisions_total`
/// Labels: `outcome`, `reason`
pub fn record_gate_decision(outcome: &'static str, reason: Option<&'static str>) {
    counter!(
        "eg_gate_decisions_total",
        "outcome" => outcome,
        "reason" => reason.unwrap_or("none")
    )
    .increment(1);
}

/// Record one key-set fetch attempt.
///
/// Metric: `eg_keyset_fetch_total`
/// Labels: `result`
pub fn record_keyset_fetch(result: &'static str) {
    counter!("eg_keyset_fetch_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Recording without an installed recorder is a no-op; these verify the
    // calls are well-formed for both label shapes.

    #[test]
    fn test_record_gate_decision_accept() {
        record_gate_decision("accept", None);
    }

    #[test]
    fn test_record_gate_decision_reject() {
        record_gate_decision("reject", Some("malformed_token"));
    }

    #[test]
    fn test_record_keyset_fetch() {
        record_keyset_fetch("ok");
        record_keyset_fetch("error");
    }
}
