//! Guard chain middleware
//!
//! Runs a [`GuardChain`] against each request. The chain evaluates on a
//! typed [`GuardContext`] assembled here from request parts, so the
//! guards themselves never touch HTTP types. On admission the
//! established identity is attached to the request extensions for the
//! handler; on rejection the structured error body goes out with the
//! request's correlation id and the handler never runs.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::guard::{GuardChain, GuardContext};

/// Header carrying the correlation id threaded by the upstream
/// request-id facility
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extract the client IP from request headers or connection info
///
/// Proxy headers take precedence so rate limiting keys on the real
/// client behind a reverse proxy; the socket address is the fallback.
pub fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> String {
    // X-Forwarded-For can contain multiple IPs; the first is the client
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                let ip = ip.trim();
                if ip.parse::<IpAddr>().is_ok() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            let ip = value.trim();
            if ip.parse::<IpAddr>().is_ok() {
                return ip.to_string();
            }
        }
    }

    if let Some(connect_info) = connect_info {
        return connect_info.0.ip().to_string();
    }

    tracing::warn!("Could not determine client IP for rate limiting");
    "unknown".to_string()
}

/// Middleware that runs a guard chain before the inner handler
///
/// Attach per route group with
/// `axum::middleware::from_fn_with_state(Arc::new(chain), run_guard_chain)`.
pub async fn run_guard_chain(
    State(chain): State<Arc<GuardChain>>,
    mut request: Request,
    next: Next,
) -> Response {
    let connect_info = request.extensions().get::<ConnectInfo<SocketAddr>>();
    let client_ip = extract_client_ip(request.headers(), connect_info);

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // A header that is present but not valid UTF-8 must still count as
    // present so it is rejected as malformed, not treated as anonymous
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or("").to_string());

    let mut ctx = GuardContext::new(client_ip)
        .with_auth_header(auth_header)
        .with_request_id(request_id);

    match chain.run(&mut ctx) {
        Ok(()) => {
            if let Some(identity) = ctx.take_identity() {
                request.extensions_mut().insert(identity);
            }
            let rate_limit = ctx.rate_limit();

            let mut response = next.run(request).await;

            if let Some(status) = rate_limit {
                let headers = response.headers_mut();
                headers.insert("X-RateLimit-Limit", HeaderValue::from(status.limit));
                headers.insert("X-RateLimit-Remaining", HeaderValue::from(status.remaining));
                headers.insert("X-RateLimit-Reset", HeaderValue::from(status.window_secs));
            }
            response
        }
        Err(err) => {
            let request_id = ctx.request_id().map(str::to_string);
            err.into_response_with_request_id(request_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 10.0.0.1"),
        );

        assert_eq!(extract_client_ip(&headers, None), "203.0.113.1");
    }

    #[test]
    fn test_extract_client_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.42"));

        assert_eq!(extract_client_ip(&headers, None), "198.51.100.42");
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.42"));

        assert_eq!(extract_client_ip(&headers, None), "203.0.113.1");
    }

    #[test]
    fn test_extract_client_ip_invalid_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.42"));

        assert_eq!(extract_client_ip(&headers, None), "198.51.100.42");
    }

    #[test]
    fn test_extract_client_ip_unknown_without_sources() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, None), "unknown");
    }
}
