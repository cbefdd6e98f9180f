//! Access probe HTTP route handlers
//!
//! One endpoint per guard tier, each returning the identity the pipeline
//! established. Deployments use these to verify guard wiring end to end
//! without touching forum content:
//! - `GET /admin/test` - admin-only chain
//! - `GET /moderation/test` - moderator-or-admin chain
//! - `GET /users/test` - any authenticated user
//! - `GET /whoami` - optional authentication
//! - `POST /threads/test` - participant allow-list plus the write ceiling
//! - `POST /replies/test` - participant allow-list plus stacked reply
//!   ceilings

use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::guard::{
    AdminOnly, AuthGuard, GuardChain, ModeratorOrAdmin, RateLimiter, RoleAllowList,
};
use crate::middleware::{run_guard_chain, CurrentUser, MaybeUser};
use crate::models::{Identity, Role};
use crate::services::TokenVerifier;

/// Process-wide rate limiter instances shared into the probe chains
#[derive(Clone)]
pub struct ProbeLimiters {
    pub write: Arc<RateLimiter>,
    pub reply: Arc<RateLimiter>,
    pub reply_burst: Arc<RateLimiter>,
}

/// Response body for probe endpoints
#[derive(Debug, Serialize)]
struct ProbeResponse {
    message: &'static str,
    user_id: Uuid,
    role: String,
    endpoint: &'static str,
    timestamp: String,
}

impl ProbeResponse {
    fn new(message: &'static str, endpoint: &'static str, identity: &Identity) -> Self {
        Self {
            message,
            user_id: identity.user_id,
            role: identity.role.as_str().to_string(),
            endpoint,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn with_chain(router: Router, chain: GuardChain) -> Router {
    router.route_layer(middleware::from_fn_with_state(
        Arc::new(chain),
        run_guard_chain,
    ))
}

/// Create the probe router with one guard chain per route group
pub fn probe_router(verifier: Arc<TokenVerifier>, limiters: ProbeLimiters) -> Router {
    let admin_routes = with_chain(
        Router::new().route("/admin/test", get(admin_probe)),
        GuardChain::new()
            .guard(AuthGuard::mandatory(verifier.clone()))
            .guard(AdminOnly),
    );

    let moderation_routes = with_chain(
        Router::new().route("/moderation/test", get(moderation_probe)),
        GuardChain::new()
            .guard(AuthGuard::mandatory(verifier.clone()))
            .guard(ModeratorOrAdmin),
    );

    let user_routes = with_chain(
        Router::new().route("/users/test", get(user_probe)),
        GuardChain::new().guard(AuthGuard::mandatory(verifier.clone())),
    );

    let whoami_routes = with_chain(
        Router::new().route("/whoami", get(whoami)),
        GuardChain::new().guard(AuthGuard::optional(verifier.clone())),
    );

    // Mirrors the forum's write routes: participants only, behind the
    // general write ceiling
    let thread_routes = with_chain(
        Router::new().route("/threads/test", post(thread_write_probe)),
        GuardChain::new()
            .guard(AuthGuard::mandatory(verifier.clone()))
            .guard(RoleAllowList::new([Role::User, Role::Moderator]))
            .shared(limiters.write),
    );

    // Reply creation stacks the burst ceiling with the per-minute one;
    // both must admit
    let reply_routes = with_chain(
        Router::new().route("/replies/test", post(reply_write_probe)),
        GuardChain::new()
            .guard(AuthGuard::mandatory(verifier))
            .guard(RoleAllowList::new([Role::User, Role::Moderator]))
            .shared(limiters.reply_burst)
            .shared(limiters.reply),
    );

    Router::new()
        .merge(admin_routes)
        .merge(moderation_routes)
        .merge(user_routes)
        .merge(whoami_routes)
        .merge(thread_routes)
        .merge(reply_routes)
}

async fn admin_probe(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
    Json(ProbeResponse::new(
        "Admin access confirmed",
        "admin-only",
        &identity,
    ))
}

async fn moderation_probe(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
    Json(ProbeResponse::new(
        "Moderator/Admin access confirmed",
        "moderator-or-admin",
        &identity,
    ))
}

async fn user_probe(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
    Json(ProbeResponse::new(
        "Authenticated user access confirmed",
        "authenticated-user",
        &identity,
    ))
}

/// Anonymous callers get a well-formed response rather than an error;
/// authenticated callers see their established identity
async fn whoami(MaybeUser(identity): MaybeUser) -> impl IntoResponse {
    match identity {
        Some(identity) => Json(serde_json::json!({
            "authenticated": true,
            "user_id": identity.user_id,
            "role": identity.role.as_str(),
        })),
        None => Json(serde_json::json!({
            "authenticated": false,
        })),
    }
}

async fn thread_write_probe(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
    Json(ProbeResponse::new(
        "Thread write access confirmed",
        "thread-write",
        &identity,
    ))
}

async fn reply_write_probe(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
    Json(ProbeResponse::new(
        "Reply write access confirmed",
        "reply-write",
        &identity,
    ))
}
