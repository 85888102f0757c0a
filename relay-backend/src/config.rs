use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const MESSAGING_API_ENDPOINT: &str = "MESSAGING_API_ENDPOINT";
    pub const MESSAGING_API_TOKEN: &str = "MESSAGING_API_TOKEN";
    pub const HANDOFF_BASE_URL: &str = "HANDOFF_BASE_URL";
    pub const DRAFT_REPLY_LANGUAGE: &str = "DRAFT_REPLY_LANGUAGE";
    pub const DRAFT_MAX_WORDS: &str = "DRAFT_MAX_WORDS";
    pub const DRAFT_HISTORY_TURNS: &str = "DRAFT_HISTORY_TURNS";
    pub const DRAFT_DEFAULT_ENDPOINT: &str = "DRAFT_DEFAULT_ENDPOINT";
    pub const DRAFT_CHAT_ENDPOINT: &str = "DRAFT_CHAT_ENDPOINT";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/relay.db";
    pub const HANDOFF_BASE_URL: &str = "https://wa.me";
    pub const DRAFT_REPLY_LANGUAGE: &str = "Spanish";
    pub const DRAFT_MAX_WORDS: usize = 60;
    pub const DRAFT_HISTORY_TURNS: usize = 20;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// External messaging-API send endpoint; None means the channel is not
    /// configured and every send falls back to hand-off.
    pub messaging_endpoint: Option<String>,
    pub messaging_token: Option<String>,
    pub handoff_base: String,
    pub reply_language: String,
    pub draft_max_words: usize,
    pub draft_history_turns: usize,
    /// Deployment-level provider endpoint overrides. None means the
    /// provider client's built-in endpoint; a per-request endpoint still
    /// wins over both.
    pub draft_default_endpoint: Option<String>,
    pub draft_chat_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            messaging_endpoint: env::var(env_vars::MESSAGING_API_ENDPOINT)
                .ok()
                .filter(|v| !v.is_empty()),
            messaging_token: env::var(env_vars::MESSAGING_API_TOKEN)
                .ok()
                .filter(|v| !v.is_empty()),
            handoff_base: env::var(env_vars::HANDOFF_BASE_URL)
                .unwrap_or_else(|_| defaults::HANDOFF_BASE_URL.to_string()),
            reply_language: env::var(env_vars::DRAFT_REPLY_LANGUAGE)
                .unwrap_or_else(|_| defaults::DRAFT_REPLY_LANGUAGE.to_string()),
            draft_max_words: env::var(env_vars::DRAFT_MAX_WORDS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::DRAFT_MAX_WORDS),
            draft_history_turns: env::var(env_vars::DRAFT_HISTORY_TURNS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::DRAFT_HISTORY_TURNS),
            draft_default_endpoint: env::var(env_vars::DRAFT_DEFAULT_ENDPOINT)
                .ok()
                .filter(|v| !v.is_empty()),
            draft_chat_endpoint: env::var(env_vars::DRAFT_CHAT_ENDPOINT)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_endpoints_come_from_env() {
        env::set_var(env_vars::DRAFT_DEFAULT_ENDPOINT, "https://llm.internal/v1beta/models");
        env::set_var(env_vars::DRAFT_CHAT_ENDPOINT, "https://llm.internal/v1/chat/completions");

        let config = Config::from_env();
        assert_eq!(
            config.draft_default_endpoint.as_deref(),
            Some("https://llm.internal/v1beta/models")
        );
        assert_eq!(
            config.draft_chat_endpoint.as_deref(),
            Some("https://llm.internal/v1/chat/completions")
        );

        env::remove_var(env_vars::DRAFT_DEFAULT_ENDPOINT);
        env::remove_var(env_vars::DRAFT_CHAT_ENDPOINT);
        let config = Config::from_env();
        assert_eq!(config.draft_default_endpoint, None);
        assert_eq!(config.draft_chat_endpoint, None);
    }
}
