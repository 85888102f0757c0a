use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::draft::types::{DraftError, ProviderConfig};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// Default draft provider: a generation-model endpoint taking a single
/// instruction string and returning candidate texts.
#[derive(Clone)]
pub struct InstructClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl InstructClient {
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
        })
    }

    /// Returns `Ok(None)` when the provider generated an empty draft.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>, DraftError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DraftError::Transport(e.to_string()))?;

        let status = response.status();
        let parsed: GenerateResponse = response
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
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
