//! Shared helpers for integration tests

#![allow(dead_code)]

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

/// Signing secret shared by the test token issuer and the verifier
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcd";

/// Mint a signed access token with the given claims
pub fn mint_token(sub: &str, role: &str, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": sub,
            "role": role,
            "exp": chrono::Utc::now().timestamp() + 600,
        }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Mint a token for a fresh account with the given role
pub fn token_for_role(role: &str) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let token = mint_token(&user_id.to_string(), role, TEST_SECRET);
    (user_id, token)
}

/// Read a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
