//! Anthropic Messages API provider (`/v1/messages`).
//!
//! Exposes a single `complete(content, system) -> String` interface matching
//! the rest of the `LlmProvider` abstraction. Wire types are private to this
//! module. One request per call; no retry.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::llm::ProviderError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic Messages endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_base_url: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

impl AnthropicProvider {
    /// `api_key` is `None` when `ANTHROPIC_API_KEY` is unset; every
    /// `complete` then fails fast with [`ProviderError::NotConfigured`].
    pub fn new(
        api_base_url: String,
        model: String,
        max_tokens: u32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, max_tokens, api_key })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `content` as the only user message with `system` as the system
    /// prompt, returning the first text block of the reply.
    pub async fn complete(&self, content: &str, system: &str) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured);
        };

        let payload = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message { role: "user", content }],
        };

        debug!(
            model = %self.model,
            max_tokens = self.max_tokens,
            content_len = content.len(),
            "sending messages request"
        );

        let response = self
            .client
            .post(&self.api_base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.api_base_url, error = %e, timeout = e.is_timeout(), "messages request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<MessagesResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize messages response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(blocks = parsed.content.len(), "received messages response");

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .ok_or_else(|| ProviderError::Request("no text content in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

/// Return the response if successful, otherwise a structured error. HTTP 429
/// becomes [`ProviderError::RateLimited`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => match env.error.kind {
            Some(kind) => format!("HTTP {status} [{kind}]: {}", env.error.message),
            None => format!("HTTP {status}: {}", env.error.message),
        },
        Err(_) => format!("HTTP {status}: {body}"),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(%status, %message, "messages request rate limited upstream");
        return Err(ProviderError::RateLimited(message));
    }

    error!(%status, %message, "messages request returned HTTP error");
    Err(ProviderError::Request(message))
}
