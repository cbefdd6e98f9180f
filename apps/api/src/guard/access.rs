//! Role-based access guards
//!
//! Pure predicates over the identity established by [`AuthGuard`]. Each
//! fails closed: a missing identity is rejected as unauthenticated, never
//! treated as any particular role. Among themselves these guards are
//! order-insensitive; they only require that identity extraction ran
//! first.
//!
//! [`AuthGuard`]: crate::guard::AuthGuard

use crate::error::{ApiError, ApiResult};
use crate::guard::{Guard, GuardContext};
use crate::models::{Identity, Role};

fn require_identity(ctx: &GuardContext) -> ApiResult<&Identity> {
    ctx.identity().ok_or(ApiError::Unauthorized)
}

/// Passes iff the current role is a member of the configured set
#[derive(Debug, Clone)]
pub struct RoleAllowList {
    roles: Vec<Role>,
}

impl RoleAllowList {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl Guard for RoleAllowList {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        let identity = require_identity(ctx)?;
        if self.roles.iter().any(|role| identity.role.is(*role)) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %identity.user_id,
                role = identity.role.as_str(),
                "Role not in allow-list"
            );
            Err(ApiError::Forbidden)
        }
    }
}

/// Passes iff the current role is exactly Admin
///
/// Moderator does not satisfy this check; there is no implicit
/// escalation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminOnly;

impl Guard for AdminOnly {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        let identity = require_identity(ctx)?;
        if identity.role.is(Role::Admin) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %identity.user_id,
                role = identity.role.as_str(),
                "Admin-only route refused"
            );
            Err(ApiError::Forbidden)
        }
    }
}

/// Passes iff the current role is Moderator or Admin
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeratorOrAdmin;

impl Guard for ModeratorOrAdmin {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        let identity = require_identity(ctx)?;
        if identity.role.is(Role::Moderator) || identity.role.is(Role::Admin) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %identity.user_id,
                role = identity.role.as_str(),
                "Moderation route refused"
            );
            Err(ApiError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleClaim;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use uuid::Uuid;

    fn ctx_with_role(claim: &str) -> GuardContext {
        let mut ctx = GuardContext::new("10.0.0.1");
        ctx.set_identity(Identity {
            user_id: Uuid::new_v4(),
            role: RoleClaim::new(claim),
        });
        ctx
    }

    #[rstest]
    #[case("moderator")]
    #[case("admin")]
    fn test_allow_list_admits_members(#[case] claim: &str) {
        let guard = RoleAllowList::new([Role::Moderator, Role::Admin]);
        let mut ctx = ctx_with_role(claim);
        assert!(guard.evaluate(&mut ctx).is_ok());
    }

    #[test]
    fn test_allow_list_rejects_non_member() {
        let guard = RoleAllowList::new([Role::Moderator, Role::Admin]);
        let mut ctx = ctx_with_role("user");
        assert_matches!(guard.evaluate(&mut ctx), Err(ApiError::Forbidden));
    }

    #[test]
    fn test_allow_list_rejects_unrecognized_role() {
        let guard = RoleAllowList::new([Role::User, Role::Moderator, Role::Admin]);
        let mut ctx = ctx_with_role("root");
        assert_matches!(guard.evaluate(&mut ctx), Err(ApiError::Forbidden));
    }

    #[test]
    fn test_admin_only_admits_admin() {
        let mut ctx = ctx_with_role("admin");
        assert!(AdminOnly.evaluate(&mut ctx).is_ok());
    }

    #[rstest]
    #[case("user")]
    #[case("moderator")]
    fn test_admin_only_rejects_others(#[case] claim: &str) {
        let mut ctx = ctx_with_role(claim);
        assert_matches!(AdminOnly.evaluate(&mut ctx), Err(ApiError::Forbidden));
    }

    #[rstest]
    #[case("moderator")]
    #[case("admin")]
    fn test_moderator_or_admin_admits(#[case] claim: &str) {
        let mut ctx = ctx_with_role(claim);
        assert!(ModeratorOrAdmin.evaluate(&mut ctx).is_ok());
    }

    #[test]
    fn test_moderator_or_admin_rejects_user() {
        let mut ctx = ctx_with_role("user");
        assert_matches!(ModeratorOrAdmin.evaluate(&mut ctx), Err(ApiError::Forbidden));
    }

    #[test]
    fn test_guards_fail_closed_without_identity() {
        let mut ctx = GuardContext::new("10.0.0.1");
        assert_matches!(AdminOnly.evaluate(&mut ctx), Err(ApiError::Unauthorized));
        assert_matches!(
            ModeratorOrAdmin.evaluate(&mut ctx),
            Err(ApiError::Unauthorized)
        );
        assert_matches!(
            RoleAllowList::new([Role::User]).evaluate(&mut ctx),
            Err(ApiError::Unauthorized)
        );
    }
}
