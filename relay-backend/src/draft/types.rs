use serde::{Deserialize, Serialize};

/// Which provider variant handles a draft request. Exactly one provider is
/// invoked per request; there is no cross-provider fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftProvider {
    /// Generation-model call taking a single instruction string.
    Instruct,
    /// Chat-completion call taking a system+user message pair.
    Chat,
}

impl DraftProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftProvider::Instruct => "instruct",
            DraftProvider::Chat => "chat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "instruct" => Some(DraftProvider::Instruct),
            "chat" => Some(DraftProvider::Chat),
            _ => None,
        }
    }
}

/// Provider configuration, read at call time and never cached across calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub provider: DraftProvider,
    pub api_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Draft-side error taxonomy. Configuration errors are detected before any
/// network call; provider-reported rejections are surfaced distinctly from
/// transport failures; cancellation is not an error the operator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    Config(String),
    Provider(String),
    Transport(String),
    Cancelled,
}

impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::Config(reason) => write!(f, "configuration error: {}", reason),
            DraftError::Provider(reason) => write!(f, "provider error: {}", reason),
            DraftError::Transport(reason) => write!(f, "transport error: {}", reason),
            DraftError::Cancelled => write!(f, "draft cancelled"),
        }
    }
}

impl std::error::Error for DraftError {}
