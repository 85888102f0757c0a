pub mod chat;
pub mod context;
pub mod instruct;
pub mod supervisor;
pub mod types;

pub use context::{build_prompt, PromptOptions};
pub use supervisor::DraftSupervisor;
pub use types::{DraftError, DraftProvider, ProviderConfig};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chat::ChatClient;
use instruct::InstructClient;

/// Mock draft client for tests - returns pre-configured results from a
/// queue and records the prompts it was asked to complete.
#[derive(Clone, Default)]
pub struct MockDraftClient {
    results: Arc<Mutex<VecDeque<Result<Option<String>, DraftError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockDraftClient {
    pub fn new(results: Vec<Result<Option<String>, DraftError>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(VecDeque::from(results))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn generate(&self, prompt: &str) -> Result<Option<String>, DraftError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Some("(mock exhausted)".to_string())))
    }
}

/// Unified draft client over the interchangeable provider variants.
/// Callers never branch on provider type beyond construction.
pub enum DraftClient {
    Instruct(InstructClient),
    Chat(ChatClient),
    Mock(MockDraftClient),
}

impl DraftClient {
    /// Build a client for the configured provider. A missing or empty API
    /// key fails here, before any network call.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, DraftError> {
        match config.provider {
            DraftProvider::Instruct => Ok(DraftClient::Instruct(InstructClient::new(config)?)),
            DraftProvider::Chat => Ok(DraftClient::Chat(ChatClient::new(config)?)),
        }
    }

    /// Generate a draft for the assembled prompt. `Ok(None)` means the
    /// provider produced no usable text, which is not an error.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>, DraftError> {
        match self {
            DraftClient::Instruct(client) => client.generate(prompt).await,
            DraftClient::Chat(client) => client.generate(prompt).await,
            DraftClient::Mock(client) => client.generate(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: DraftProvider, api_key: &str) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: api_key.to_string(),
            endpoint: None,
            model: None,
            max_tokens: None,
        }
    }

    #[test]
    fn empty_api_key_is_a_configuration_error() {
        for provider in [DraftProvider::Instruct, DraftProvider::Chat] {
            let err = DraftClient::from_config(&config(provider, "")).err().unwrap();
            assert!(matches!(err, DraftError::Config(_)));

            let err = DraftClient::from_config(&config(provider, "   ")).err().unwrap();
            assert!(matches!(err, DraftError::Config(_)));
        }
    }

    #[test]
    fn valid_key_builds_the_selected_provider() {
        let client = DraftClient::from_config(&config(DraftProvider::Instruct, "k")).unwrap();
        assert!(matches!(client, DraftClient::Instruct(_)));

        let client = DraftClient::from_config(&config(DraftProvider::Chat, "k")).unwrap();
        assert!(matches!(client, DraftClient::Chat(_)));
    }

    #[tokio::test]
    async fn empty_mock_text_is_no_draft_not_an_error() {
        let client = DraftClient::Mock(MockDraftClient::new(vec![Ok(None)]));
        let result = client.generate("prompt").await.unwrap();
        assert_eq!(result, None);
    }
}
