//! Identity extraction from verified claims
//!
//! Turns a signature-verified claim set into a typed [`Identity`]. Each
//! malformation gets its own error so clients can tell a missing subject
//! from a malformed one. Role membership is deliberately not enforced
//! here: the access guards are the enforcement point, and an unrecognized
//! role string never matches any allow-list.

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Identity, RawClaims, RoleClaim};

/// Extract a typed identity from verified claims
///
/// Only call this with claims that already passed signature verification;
/// no partial identity is ever produced.
pub fn extract_identity(claims: &RawClaims) -> ApiResult<Identity> {
    let sub = claims
        .sub
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or(ApiError::TokenClaimInvalidSub)?;

    let user_id = Uuid::parse_str(sub).map_err(|_| ApiError::TokenClaimInvalidSubFormat)?;

    let role = claims
        .role
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or(ApiError::TokenClaimInvalidRole)?;

    Ok(Identity {
        user_id,
        role: RoleClaim::new(role),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use serde_json::{json, Value};

    fn claims(sub: Option<Value>, role: Option<Value>) -> RawClaims {
        RawClaims {
            sub,
            role,
            exp: chrono::Utc::now().timestamp() + 600,
            iat: None,
            nbf: None,
        }
    }

    #[test]
    fn test_extract_valid_identity() {
        let id = Uuid::new_v4();
        let identity =
            extract_identity(&claims(Some(json!(id.to_string())), Some(json!("moderator"))))
                .unwrap();

        assert_eq!(identity.user_id, id);
        assert!(identity.role.is(Role::Moderator));
    }

    #[test]
    fn test_missing_subject_claim() {
        assert_matches!(
            extract_identity(&claims(None, Some(json!("user")))),
            Err(ApiError::TokenClaimInvalidSub)
        );
    }

    #[test]
    fn test_non_string_subject_claim() {
        assert_matches!(
            extract_identity(&claims(Some(json!(42)), Some(json!("user")))),
            Err(ApiError::TokenClaimInvalidSub)
        );
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[case("1234")]
    fn test_malformed_subject_claim(#[case] sub: &str) {
        assert_matches!(
            extract_identity(&claims(Some(json!(sub)), Some(json!("user")))),
            Err(ApiError::TokenClaimInvalidSubFormat)
        );
    }

    #[test]
    fn test_missing_role_claim() {
        let id = Uuid::new_v4().to_string();
        assert_matches!(
            extract_identity(&claims(Some(json!(id)), None)),
            Err(ApiError::TokenClaimInvalidRole)
        );
    }

    #[test]
    fn test_non_string_role_claim() {
        let id = Uuid::new_v4().to_string();
        assert_matches!(
            extract_identity(&claims(Some(json!(id)), Some(json!(["admin"])))),
            Err(ApiError::TokenClaimInvalidRole)
        );
    }

    #[test]
    fn test_unrecognized_role_string_is_accepted_here() {
        // Membership is enforced by the access guards, not the extractor
        let id = Uuid::new_v4();
        let identity = extract_identity(&claims(
            Some(json!(id.to_string())),
            Some(json!("superuser")),
        ))
        .unwrap();

        assert_eq!(identity.role.known(), None);
    }
}
