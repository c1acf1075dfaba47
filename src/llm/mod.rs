//! Answer generator: LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! Every call is a single attempt; nothing here retries.

pub mod persona;
pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API credential configured; no request was attempted.
    #[error("provider not configured: missing API key")]
    NotConfigured,
    /// The upstream API answered with its own rate-limit status.
    #[error("provider rate limited: {0}")]
    RateLimited(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Anthropic(providers::anthropic::AnthropicProvider),
    Dummy(providers::dummy::DummyProvider),
}

impl LlmProvider {
    /// Send `content` as the user turn with `system` as the instruction and
    /// return the first text segment of the reply.
    pub async fn complete(&self, content: &str, system: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Anthropic(p) => p.complete(content, system).await,
            LlmProvider::Dummy(p) => p.complete(content, system).await,
        }
    }

    /// Answer a visitor question in Kai's voice.
    pub async fn answer(&self, question: &str) -> Result<String, ProviderError> {
        self.complete(question, persona::KAI_SYSTEM).await
    }
}
