//! Dummy provider: echoes input back prefixed with `[echo]`.
//! Lets the whole ask flow run locally without an API key.

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, content: &str, _system: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {content}"))
    }
}
