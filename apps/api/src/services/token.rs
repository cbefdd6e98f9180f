//! Bearer token verification
//!
//! The verifier is constructed once from the shared signing secret and is
//! pinned to the HMAC family: a token signed with any other algorithm
//! (including `none`) fails verification outright, closing the
//! algorithm-substitution forgery hole. Verification is a pure,
//! bounded-time computation; no partial trust is given to a token that
//! fails any check.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::{ApiError, ApiResult};
use crate::models::RawClaims;

/// Parse an `Authorization` header value into the bearer token it carries
///
/// The header must be exactly two space-separated parts with the literal
/// scheme `Bearer` and a non-empty token.
pub fn parse_bearer_header(header: &str) -> ApiResult<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
        return Err(ApiError::AuthHeaderInvalidFormat);
    }
    Ok(parts[1])
}

/// Validates token signatures and standard time-based claims against the
/// shared signing secret
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The decoding key must never leak through Debug output
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier for the given signing secret, pinned to HS256
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token's signature and time-based claims
    ///
    /// Returns the raw claim set unmodified on success; `sub` and `role`
    /// are not interpreted here. Any verification failure (bad signature,
    /// wrong algorithm, expired, not yet valid, malformed encoding) maps
    /// to `TokenInvalid` without distinguishing the cause to the caller.
    pub fn verify(&self, token: &str) -> ApiResult<RawClaims> {
        let token_data =
            decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                ApiError::TokenInvalid
            })?;

        Ok(token_data.claims)
    }
}
