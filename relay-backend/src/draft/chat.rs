use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::draft::types::{DraftError, ProviderConfig};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 256;

const SYSTEM_INSTRUCTION: &str =
    "You draft short replies on behalf of a sales agent. Follow the instructions in the user message exactly.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// Alternate draft provider: a chat-completion endpoint taking a
/// system+user message pair and a token-limit parameter.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, DraftError> {
        // Fail fast before any network call.
        if config.api_key.trim().is_empty() {
            return Err(DraftError::Config("missing API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DraftError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// Returns `Ok(None)` when the provider generated an empty draft.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>, DraftError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DraftError::Transport(e.to_string()))?;

        let status = response.status();
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DraftError::Transport(format!("invalid provider response: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(DraftError::Provider(err.message));
        }
        if !status.is_success() {
            return Err(DraftError::Provider(format!(
                "provider returned status {}",
                status
            )));
        }

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
