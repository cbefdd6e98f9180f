//! Parley API library
//!
//! This module exposes the authorization core for use by the server
//! binary, the composing service, and integration tests.

pub mod config;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use guard::{Guard, GuardChain, GuardContext};
pub use services::TokenVerifier;
