//! Identity extractors for Axum handlers
//!
//! These extract the identity the guard chain published to the request
//! extensions:
//! - `CurrentUser`: requires an established identity, rejects with 401
//!   otherwise (fail closed, never a default role)
//! - `MaybeUser`: optional identity for routes behind an optional-auth
//!   chain; `None` means the caller is anonymous
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn protected_handler(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.user_id)
//! }
//!
//! async fn public_handler(MaybeUser(identity): MaybeUser) -> impl IntoResponse {
//!     match identity {
//!         Some(identity) => format!("Hello, {}!", identity.user_id),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::models::Identity;

/// Extractor requiring an identity established by the guard chain
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

/// Extractor for optionally-authenticated routes
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Identity>().cloned()))
    }
}
