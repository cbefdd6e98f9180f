//! Authentication HTTP route handlers
//!
//! The login endpoint composes the auth rate limiter (keyed by client
//! address) with the lockout guard (keyed by account) around a pluggable
//! credential backend. Credential verification and token issuance belong
//! to the backend; the lockout bookkeeping around the attempt happens
//! here, so a locked account is rejected before any credentials are
//! consulted.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::State,
    middleware,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::guard::{GuardChain, LockoutGuard, RateLimiter};
use crate::middleware::run_guard_chain;

/// Tokens produced by a successful credential check
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed access token
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Verifies credentials and issues tokens
///
/// Implemented by the account service; a failed check must return
/// [`ApiError::InvalidCredentials`] so the lockout guard can count it.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> ApiResult<IssuedTokens>;
}

/// Shared application state for authentication handlers
#[derive(Clone)]
pub struct AuthState {
    /// Per-account lockout tracking
    pub lockout: Arc<LockoutGuard>,
    /// Credential verification and token issuance
    pub backend: Arc<dyn CredentialBackend>,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response payload
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Create authentication router without rate limiting
///
/// Use `auth_router_with_rate_limiting` for production deployments.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(state)
}

/// Create authentication router with the per-address auth rate limiter
/// in front of the login route
pub fn auth_router_with_rate_limiting(state: AuthState, limiter: Arc<RateLimiter>) -> Router {
    let chain = GuardChain::new().shared(limiter);

    Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(chain),
            run_guard_chain,
        ))
        .with_state(state)
}

/// Handle a login attempt
///
/// Order matters: the lockout check runs before the backend sees any
/// credentials, and only an actual credential mismatch counts toward the
/// lockout threshold.
async fn login(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::ValidationError(
            "username and password are required".to_string(),
        ));
    }

    state.lockout.check(&request.username)?;

    match state
        .backend
        .authenticate(&request.username, &request.password)
        .await
    {
        Ok(tokens) => {
            state.lockout.record_success(&request.username);
            tracing::info!(username = %request.username, "Login succeeded");
            Ok(Json(LoginResponse {
                access_token: tokens.access_token,
                token_type: "Bearer",
                expires_in: tokens.expires_in,
            }))
        }
        Err(ApiError::InvalidCredentials) => {
            state.lockout.record_failure(&request.username);
            tracing::warn!(username = %request.username, "Login failed");
            Err(ApiError::InvalidCredentials)
        }
        Err(err) => Err(err),
    }
}
