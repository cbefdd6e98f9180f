//! HTTP route handlers for the Parley API
//!
//! This module contains the REST surface of the authorization core:
//! - Login endpoint wiring the lockout guard around a pluggable
//!   credential backend
//! - Health check endpoints
//! - Access probe endpoints for verifying guard wiring per role tier
//!
//! The full forum routing table (categories, threads, replies, reports)
//! belongs to the composing service; it attaches these guard chains to
//! its own routes.

pub mod auth;
pub mod health;
pub mod probe;

pub use auth::{auth_router, auth_router_with_rate_limiting, AuthState, CredentialBackend};
pub use health::health_router;
pub use probe::probe_router;
