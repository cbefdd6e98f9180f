//! User identity and token claim models
//!
//! This module contains the types flowing through the guard pipeline:
//! - `RawClaims`: the claim set exactly as decoded from a verified token
//! - `Role`: the closed role enumeration used by access policy
//! - `RoleClaim`: the role claim as asserted by the token
//! - `Identity`: the per-request (user id, role) pair published to handlers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// User role enumeration
///
/// Admin and Moderator are distinct for admin-only checks; there is no
/// implicit escalation. A request either has no role (anonymous) or
/// exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Canonical claim-string spelling of this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role claim as asserted by a verified token
///
/// Kept as the raw claim string: the extractor does not enforce
/// membership in [`Role`]. An unrecognized role string simply never
/// matches any allow-list, which is equivalent to no access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleClaim(String);

impl RoleClaim {
    pub fn new(claim: impl Into<String>) -> Self {
        Self(claim.into())
    }

    /// The raw claim string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The known role this claim names, if any
    pub fn known(&self) -> Option<Role> {
        self.0.parse().ok()
    }

    /// Whether this claim names exactly the given role
    pub fn is(&self, role: Role) -> bool {
        self.known() == Some(role)
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        Self(role.as_str().to_string())
    }
}

/// Per-request identity established by the authentication guard
///
/// Created once per request from verified claims, attached to the request
/// scope, read by downstream guards and handlers, and discarded at request
/// end. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    /// Unique account identifier from the `sub` claim
    pub user_id: Uuid,
    /// Role asserted by the `role` claim
    pub role: RoleClaim,
}

/// Claim set exactly as decoded from a signature-verified token
///
/// `sub` and `role` stay untyped here: the token verifier does not
/// interpret them. Turning them into an [`Identity`] is the identity
/// extractor's job, with its own error taxonomy for each malformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClaims {
    /// Subject (account identifier), shape unchecked at this layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,

    /// Role asserted by the issuer, shape unchecked at this layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,

    /// Expiration timestamp (Unix epoch)
    pub exp: i64,

    /// Issued at timestamp (Unix epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_claim_string() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_role_claim_known_roles() {
        assert_eq!(RoleClaim::new("admin").known(), Some(Role::Admin));
        assert_eq!(RoleClaim::new("moderator").known(), Some(Role::Moderator));
        assert_eq!(RoleClaim::new("user").known(), Some(Role::User));
    }

    #[test]
    fn test_unrecognized_role_claim_matches_nothing() {
        let claim = RoleClaim::new("superuser");
        assert_eq!(claim.known(), None);
        assert!(!claim.is(Role::User));
        assert!(!claim.is(Role::Moderator));
        assert!(!claim.is(Role::Admin));
    }

    #[test]
    fn test_role_claim_is_case_sensitive() {
        assert_eq!(RoleClaim::new("Admin").known(), None);
    }
}
