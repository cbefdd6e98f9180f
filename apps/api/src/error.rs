//! Error handling for the Parley API
//!
//! This module provides a unified error type hierarchy using thiserror,
//! with automatic HTTP status code mapping via Axum's IntoResponse trait.
//! Every guard rejection maps to a machine-readable code plus a
//! human-readable message; internal details (signing secret, raw claims)
//! never appear in response bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
    /// Correlation identifier threaded from the request-id facility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Main API error type covering the authorization pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // ========== Credential presentation ==========
    /// No Authorization header on a route that requires one
    #[error("authorization header missing")]
    AuthHeaderMissing,

    /// Authorization header present but not `Bearer <token>`
    #[error("invalid authorization header format")]
    AuthHeaderInvalidFormat,

    /// Token failed signature, algorithm, or time-based validation
    #[error("invalid token")]
    TokenInvalid,

    // ========== Claim validation ==========
    /// Subject claim missing or not a string
    #[error("invalid subject claim")]
    TokenClaimInvalidSub,

    /// Subject claim present but not a valid account identifier
    #[error("invalid subject claim format")]
    TokenClaimInvalidSubFormat,

    /// Role claim missing or not a string
    #[error("invalid role claim")]
    TokenClaimInvalidRole,

    // ========== Policy ==========
    /// Identity required but none established
    #[error("authentication required")]
    Unauthorized,

    /// Identity present but the role check failed
    #[error("insufficient permissions")]
    Forbidden,

    /// Login credentials did not match
    #[error("invalid credentials")]
    InvalidCredentials,

    // ========== Throttling ==========
    /// Rate limit ceiling exceeded for the client address
    #[error("rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Account temporarily locked after repeated failed logins
    #[error("account temporarily locked, retry after {retry_after} seconds")]
    AccountLocked { retry_after: u64 },

    // ========== Request & server errors ==========
    /// Request validation failed
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401 Unauthorized
            Self::AuthHeaderMissing
            | Self::AuthHeaderInvalidFormat
            | Self::TokenInvalid
            | Self::TokenClaimInvalidSub
            | Self::TokenClaimInvalidSubFormat
            | Self::TokenClaimInvalidRole
            | Self::Unauthorized
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::Forbidden => StatusCode::FORBIDDEN,

            // 429 Too Many Requests
            Self::RateLimited { .. } | Self::AccountLocked { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 400 Bad Request
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthHeaderMissing => "AUTH_HEADER_MISSING",
            Self::AuthHeaderInvalidFormat => "AUTH_HEADER_INVALID_FORMAT",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenClaimInvalidSub => "TOKEN_CLAIM_INVALID_SUB",
            Self::TokenClaimInvalidSubFormat => "TOKEN_CLAIM_INVALID_SUB_FORMAT",
            Self::TokenClaimInvalidRole => "TOKEN_CLAIM_INVALID_ROLE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Seconds the client should wait before retrying, if this error
    /// carries one
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } | Self::AccountLocked { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Authorization error"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }

    /// Build the HTTP response, threading an optional correlation id into
    /// the body
    pub fn into_response_with_request_id(self, request_id: Option<String>) -> Response {
        self.log();

        let status = self.status_code();
        let retry_after = self.retry_after();
        let body = Json(ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
            request_id,
        });

        match retry_after {
            Some(secs) => (status, [("Retry-After", secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with_request_id(None)
    }
}
