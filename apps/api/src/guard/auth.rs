//! Authentication guard
//!
//! Verifies the bearer token and publishes the extracted identity to the
//! request context. Two operating modes:
//!
//! - **Mandatory**: absence of a valid token is terminal; the request is
//!   rejected with whatever verifier/extractor error occurred.
//! - **Optional**: a request with no `Authorization` header at all
//!   proceeds anonymously, but a header that is present and invalid fails
//!   exactly as in mandatory mode. Public endpoints use this to recognize
//!   authenticated callers while still rejecting garbage credentials.

use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::guard::{Guard, GuardContext};
use crate::services::{extract_identity, parse_bearer_header, TokenVerifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Mandatory,
    Optional,
}

/// Guard that establishes the caller's identity from a bearer token
#[derive(Clone)]
pub struct AuthGuard {
    verifier: Arc<TokenVerifier>,
    mode: AuthMode,
}

impl AuthGuard {
    /// Require a valid token; reject the request otherwise
    pub fn mandatory(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            mode: AuthMode::Mandatory,
        }
    }

    /// Recognize a valid token when present; let anonymous requests
    /// through untouched
    pub fn optional(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            mode: AuthMode::Optional,
        }
    }
}

impl Guard for AuthGuard {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        let header = match ctx.auth_header() {
            Some(h) => h.to_owned(),
            None => {
                return match self.mode {
                    AuthMode::Mandatory => Err(ApiError::AuthHeaderMissing),
                    AuthMode::Optional => Ok(()),
                };
            }
        };

        let token = parse_bearer_header(&header)?;
        let claims = self.verifier.verify(token)?;
        let identity = extract_identity(&claims)?;

        tracing::debug!(
            user_id = %identity.user_id,
            role = identity.role.as_str(),
            "Identity established"
        );
        ctx.set_identity(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    const SECRET: &str = "auth-guard-test-secret-0123456789ab";

    fn verifier() -> Arc<TokenVerifier> {
        Arc::new(TokenVerifier::new(SECRET))
    }

    fn token_for(sub: &str, role: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "sub": sub,
                "role": role,
                "exp": chrono::Utc::now().timestamp() + 600,
            }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn ctx_with_header(header: Option<String>) -> GuardContext {
        GuardContext::new("10.0.0.1").with_auth_header(header)
    }

    #[test]
    fn test_mandatory_rejects_missing_header() {
        let mut ctx = ctx_with_header(None);
        assert_matches!(
            AuthGuard::mandatory(verifier()).evaluate(&mut ctx),
            Err(ApiError::AuthHeaderMissing)
        );
    }

    #[test]
    fn test_mandatory_establishes_identity() {
        let user_id = Uuid::new_v4();
        let mut ctx = ctx_with_header(Some(format!(
            "Bearer {}",
            token_for(&user_id.to_string(), "moderator")
        )));

        AuthGuard::mandatory(verifier()).evaluate(&mut ctx).unwrap();

        let identity = ctx.identity().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role.as_str(), "moderator");
    }

    #[test]
    fn test_optional_allows_anonymous() {
        let mut ctx = ctx_with_header(None);
        AuthGuard::optional(verifier()).evaluate(&mut ctx).unwrap();
        assert!(ctx.identity().is_none());
    }

    #[test]
    fn test_optional_rejects_malformed_header() {
        // Present-but-invalid credentials fail exactly as in mandatory mode
        let mut ctx = ctx_with_header(Some("NotBearer garbage".to_string()));
        assert_matches!(
            AuthGuard::optional(verifier()).evaluate(&mut ctx),
            Err(ApiError::AuthHeaderInvalidFormat)
        );
    }

    #[test]
    fn test_optional_rejects_invalid_token() {
        let mut ctx = ctx_with_header(Some("Bearer not.a.token".to_string()));
        assert_matches!(
            AuthGuard::optional(verifier()).evaluate(&mut ctx),
            Err(ApiError::TokenInvalid)
        );
    }

    #[test]
    fn test_claim_errors_propagate() {
        let mut ctx = ctx_with_header(Some(format!("Bearer {}", token_for("not-a-uuid", "user"))));
        assert_matches!(
            AuthGuard::mandatory(verifier()).evaluate(&mut ctx),
            Err(ApiError::TokenClaimInvalidSubFormat)
        );
        // No partial identity on failure
        assert!(ctx.identity().is_none());
    }
}
