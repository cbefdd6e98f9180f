//! Data models for the Parley API

pub mod user;

pub use user::{Identity, RawClaims, Role, RoleClaim};
