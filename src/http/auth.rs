//! Admin bearer-token guard.

use axum::http::{HeaderMap, header};

use super::error::ApiError;

/// True only when `secret` is non-empty and `presented` is exactly
/// `Bearer <secret>`. An empty secret denies everyone.
fn is_authorized(presented: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    match presented {
        Some(value) => value.strip_prefix("Bearer ") == Some(secret),
        None => false,
    }
}

/// Guard for privileged handlers: reads `Authorization` from `headers`.
pub(super) fn require_admin(headers: &HeaderMap, secret: &str) -> Result<(), ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if is_authorized(presented, secret) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
