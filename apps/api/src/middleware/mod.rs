//! Axum integration for the guard pipeline
//!
//! This module adapts the framework-independent guard chain to axum:
//! - `run_guard_chain`: middleware that builds a `GuardContext` from
//!   request parts, runs a chain, and either forwards the request (with
//!   the established identity in its extensions) or short-circuits with
//!   the structured error response
//! - `CurrentUser` / `MaybeUser`: handler extractors over the identity
//!   the chain published

pub mod auth;
pub mod guard_chain;

pub use auth::{CurrentUser, MaybeUser};
pub use guard_chain::{extract_client_ip, run_guard_chain, REQUEST_ID_HEADER};
