//! Observability for the Edge Gate.

pub mod metrics;
