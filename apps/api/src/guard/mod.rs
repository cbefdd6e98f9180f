//! Request guard pipeline
//!
//! Every protected route runs an ordered chain of guards before its
//! handler. A guard either lets the request continue or terminates it with
//! a structured error; the first rejection short-circuits the chain, so a
//! handler never observes a request that failed any attached guard.
//!
//! Guards are framework-independent: they operate on a [`GuardContext`]
//! built from request parts, never on the HTTP types themselves. The axum
//! adapter lives in `crate::middleware`.
//!
//! Guards share no state with each other except the per-request context
//! and the process-wide counter components (rate limiter, lockout), which
//! are explicit instances constructed at startup and passed by handle.

pub mod access;
pub mod auth;
pub mod lockout;
pub mod rate_limit;

pub use access::{AdminOnly, ModeratorOrAdmin, RoleAllowList};
pub use auth::AuthGuard;
pub use lockout::{LockoutConfig, LockoutGuard};
pub use rate_limit::{RateLimitConfig, RateLimiter};

use std::sync::Arc;

use crate::error::ApiResult;
use crate::models::Identity;

/// A single stage of the request authorization pipeline
///
/// `Ok(())` admits the request to the next stage; `Err` terminates it.
/// Evaluation is synchronous: token verification and policy checks are
/// pure, bounded-time computations, and counter lookups are O(1) map
/// operations.
pub trait Guard: Send + Sync {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()>;
}

/// Rate-limit accounting carried back to the response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    /// Ceiling of the tightest limiter that admitted the request
    pub limit: u32,
    /// Requests remaining under that ceiling
    pub remaining: u32,
    /// Window size of that limiter in seconds
    pub window_secs: u64,
}

/// Typed per-request context threaded through the guard chain
///
/// Constructed by the HTTP adapter from request parts. The established
/// identity lives here (and is copied into request extensions for
/// handlers), never in a stringly-typed bag.
#[derive(Debug, Default)]
pub struct GuardContext {
    client_ip: String,
    request_id: Option<String>,
    auth_header: Option<String>,
    identity: Option<Identity>,
    rate_limit: Option<RateLimitStatus>,
}

impl GuardContext {
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            ..Self::default()
        }
    }

    /// Attach the raw `Authorization` header value, if the request had one
    pub fn with_auth_header(mut self, header: Option<String>) -> Self {
        self.auth_header = header;
        self
    }

    /// Attach the correlation id threaded from the request-id facility
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Client network origin used as the rate-limit key
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn auth_header(&self) -> Option<&str> {
        self.auth_header.as_deref()
    }

    /// Identity established by the authentication guard, if any
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Publish the established identity to the request scope
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn take_identity(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    pub fn rate_limit(&self) -> Option<RateLimitStatus> {
        self.rate_limit
    }

    /// Record limiter accounting; with stacked limiters the tightest
    /// (fewest remaining) wins for the response headers
    pub fn record_rate_limit(&mut self, status: RateLimitStatus) {
        match self.rate_limit {
            Some(existing) if existing.remaining <= status.remaining => {}
            _ => self.rate_limit = Some(status),
        }
    }
}

/// Explicit ordered list of guards executed by a small driver loop
///
/// Composition is logical AND: all guards must admit for the request to
/// proceed. Order matters only insofar as identity must be extracted
/// before role checks run.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an owned guard to the chain
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Append a shared guard instance (e.g. a process-wide rate limiter)
    pub fn shared(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Run the chain; the first rejection short-circuits
    pub fn run(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        for guard in &self.guards {
            guard.evaluate(ctx)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    struct SetFlag;
    struct RejectAll;

    impl Guard for SetFlag {
        fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
            ctx.record_rate_limit(RateLimitStatus {
                limit: 1,
                remaining: 1,
                window_secs: 1,
            });
            Ok(())
        }
    }

    impl Guard for RejectAll {
        fn evaluate(&self, _ctx: &mut GuardContext) -> ApiResult<()> {
            Err(ApiError::Forbidden)
        }
    }

    #[test]
    fn test_empty_chain_admits() {
        let mut ctx = GuardContext::new("10.0.0.1");
        assert!(GuardChain::new().run(&mut ctx).is_ok());
    }

    #[test]
    fn test_rejection_short_circuits() {
        let chain = GuardChain::new().guard(RejectAll).guard(SetFlag);
        let mut ctx = GuardContext::new("10.0.0.1");

        assert_eq!(chain.run(&mut ctx), Err(ApiError::Forbidden));
        // The downstream guard never ran
        assert!(ctx.rate_limit().is_none());
    }

    #[test]
    fn test_guards_run_in_order() {
        let chain = GuardChain::new().guard(SetFlag).guard(RejectAll);
        let mut ctx = GuardContext::new("10.0.0.1");

        assert_eq!(chain.run(&mut ctx), Err(ApiError::Forbidden));
        assert!(ctx.rate_limit().is_some());
    }

    #[test]
    fn test_tightest_rate_limit_status_wins() {
        let mut ctx = GuardContext::new("10.0.0.1");
        ctx.record_rate_limit(RateLimitStatus {
            limit: 30,
            remaining: 29,
            window_secs: 60,
        });
        ctx.record_rate_limit(RateLimitStatus {
            limit: 3,
            remaining: 2,
            window_secs: 10,
        });
        ctx.record_rate_limit(RateLimitStatus {
            limit: 10,
            remaining: 9,
            window_secs: 60,
        });

        let status = ctx.rate_limit().unwrap();
        assert_eq!(status.limit, 3);
        assert_eq!(status.remaining, 2);
    }
}
