//! Services for the Parley API
//!
//! The authorization core lives here:
//! - `token`: bearer header parsing and JWT signature verification
//! - `identity`: turning verified claims into a typed request identity

pub mod identity;
pub mod token;

pub use identity::extract_identity;
pub use token::{parse_bearer_header, TokenVerifier};
