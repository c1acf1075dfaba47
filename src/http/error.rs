//! Request-level error taxonomy and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`; internal causes are logged
//! where they are converted and never reach the response body.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::error::AppError;
use crate::llm::ProviderError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    /// Per-address limit hit; `retry_after_secs` feeds the `Retry-After` header.
    #[error("Too many questions. I need time to think. Try again in a minute.")]
    RateLimited { retry_after_secs: u64 },

    #[error("I'm a bit overwhelmed. Try again in a moment.")]
    UpstreamOverloaded,

    #[error("I'm not connected right now. Check back later.")]
    ServiceUnavailable,

    #[error("Something went wrong in my thinking.")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } | ApiError::UpstreamOverloaded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "invalid_input",
            ApiError::Unauthorized => "unauthorized",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::UpstreamOverloaded => "upstream_overloaded",
            ApiError::ServiceUnavailable => "unavailable",
            ApiError::Internal => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.code(), "message": self.to_string() }));
        let mut response = (self.status(), body).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotConfigured => {
                warn!("ask rejected: no generation credential configured");
                ApiError::ServiceUnavailable
            }
            ProviderError::RateLimited(msg) => {
                warn!(error = %msg, "generation provider is rate limiting");
                ApiError::UpstreamOverloaded
            }
            other => {
                error!(error = %other, "answer generation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        error!(error = %e, "request failed");
        ApiError::Internal
    }
}
