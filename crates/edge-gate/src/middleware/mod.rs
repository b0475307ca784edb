//! Middleware for in-process gate deployments.
//!
//! # Components
//!
//! - `auth` - Gate middleware for protected routes

pub mod auth;

pub use auth::{require_auth, AuthState};
