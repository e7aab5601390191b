//! API-key gate for protected routes.
//!
//! The key travels in the header named by `[auth] header`. A missing or empty
//! header is "Not authenticated"; a present but wrong one is "Invalid API
//! Key". Both answer 403.

use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use datadrop_core::config::AuthConfig;
use std::sync::Arc;
use tracing::warn;

/// `axum::middleware::from_fn_with_state` gate.
pub async fn require_api_key(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.enabled {
        let presented = request
            .headers()
            .get(auth.header.as_str())
            .and_then(|value| value.to_str().ok());
        if let Err(err) = check_key(&auth, presented) {
            warn!(path = %request.uri().path(), reason = %err, "request rejected");
            return Err(err);
        }
    }
    Ok(next.run(request).await)
}

/// Compare a presented key against the configured one.
pub fn check_key(auth: &AuthConfig, presented: Option<&str>) -> Result<(), ApiError> {
    let presented = presented
        .filter(|key| !key.is_empty())
        .ok_or(ApiError::MissingKey)?;
    match auth.api_key.as_deref() {
        Some(expected) if keys_match(expected.as_bytes(), presented.as_bytes()) => Ok(()),
        _ => Err(ApiError::InvalidKey),
    }
}

// Length leaks, content does not.
fn keys_match(expected: &[u8], presented: &[u8]) -> bool {
    expected.len() == presented.len()
        && expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
