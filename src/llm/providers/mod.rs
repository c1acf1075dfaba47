//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory: called at startup.
//! Adding a new backend = new module + new match arm.

pub mod anthropic;
pub mod dummy;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// A missing key is not an error here: the Anthropic provider is still built
/// and reports [`ProviderError::NotConfigured`] per call, so the server can
/// start and serve everything except answers.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "anthropic" => {
            let a = &config.anthropic;
            let p = anthropic::AnthropicProvider::new(
                a.api_base_url.clone(),
                a.model.clone(),
                a.max_tokens,
                a.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::Anthropic(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}
