use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::channels::types::AttemptError;
use crate::config::Config;

/// Strip everything but digits from a phone-based destination.
/// "+34 600-11-22-33" and "34600112233" address the same customer.
pub fn normalize_destination(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP transport against the external messaging-API send endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint,
            token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.messaging_endpoint.clone(),
            config.messaging_token.clone(),
        )
    }

    async fn send(&self, destination: &str, body: &str) -> Result<(), AttemptError> {
        let endpoint = match self.endpoint.as_deref() {
            Some(e) if !e.is_empty() => e,
            _ => return Err(AttemptError::NotConfigured),
        };
        let token = match self.token.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AttemptError::NotConfigured),
        };

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&SendRequest {
                to: destination,
                body,
            })
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Transport(format!("invalid provider response: {}", e)))?;

        // Only an explicit provider-reported success flag counts as sent.
        if parsed.success {
            Ok(())
        } else {
            let reason = parsed
                .error
                .unwrap_or_else(|| format!("provider returned status {}", status));
            Err(AttemptError::Rejected(reason))
        }
    }
}

/// Mock transport for tests: queued results plus a record of every call.
/// An optional gate parks each send until a permit is released, so tests
/// can hold a dispatch in flight deliberately.
#[derive(Clone, Default)]
pub struct MockTransport {
    results: Arc<Mutex<VecDeque<Result<(), AttemptError>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    gate: Option<Arc<tokio::sync::Semaphore>>,
}

impl MockTransport {
    pub fn new(results: Vec<Result<(), AttemptError>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(VecDeque::from(results))),
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Like `new`, but every send blocks until a permit is added to the
    /// returned gate.
    pub fn gated(results: Vec<Result<(), AttemptError>>) -> (Self, Arc<tokio::sync::Semaphore>) {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let mut transport = Self::new(results);
        transport.gate = Some(gate.clone());
        (transport, gate)
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    async fn send(&self, destination: &str, body: &str) -> Result<(), AttemptError> {
        self.calls
            .lock()
            .unwrap()
            .push((destination.to_string(), body.to_string()));
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Transport seam for the messaging-API channel.
#[derive(Clone)]
pub enum MessagingTransport {
    Http(HttpTransport),
    Mock(MockTransport),
}

impl MessagingTransport {
    pub async fn send(&self, destination: &str, body: &str) -> Result<(), AttemptError> {
        match self {
            MessagingTransport::Http(transport) => transport.send(destination, body).await,
            MessagingTransport::Mock(transport) => transport.send(destination, body).await,
        }
    }
}

/// Messaging-API channel adapter: normalizes the destination and delegates
/// to the configured transport.
pub struct MessagingApiAdapter {
    transport: MessagingTransport,
}

impl MessagingApiAdapter {
    pub fn new(transport: MessagingTransport) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl crate::channels::ChannelAdapter for MessagingApiAdapter {
    async fn attempt(&self, destination: &str, body: &str) -> Result<(), AttemptError> {
        let digits = normalize_destination(destination);
        self.transport.send(&digits, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_non_digits() {
        assert_eq!(normalize_destination("+34 600-11-22-33"), "34600112233");
        assert_eq!(normalize_destination("(600) 112 233"), "600112233");
        assert_eq!(normalize_destination(""), "");
        assert_eq!(normalize_destination("no digits"), "");
    }

    #[tokio::test]
    async fn unconfigured_http_transport_fails_fast() {
        let transport = MessagingTransport::Http(HttpTransport::new(None, None));
        let err = transport.send("34600112233", "hola").await.unwrap_err();
        assert_eq!(err, AttemptError::NotConfigured);

        let transport = MessagingTransport::Http(HttpTransport::new(
            Some("https://api.example.test/send".to_string()),
            Some(String::new()),
        ));
        let err = transport.send("34600112233", "hola").await.unwrap_err();
        assert_eq!(err, AttemptError::NotConfigured);
    }

    #[tokio::test]
    async fn mock_transport_records_calls() {
        let mock = MockTransport::new(vec![Ok(()), Err(AttemptError::Transport("down".into()))]);
        let transport = MessagingTransport::Mock(mock.clone());

        assert!(transport.send("600112233", "hola").await.is_ok());
        assert!(transport.send("600112233", "otra vez").await.is_err());
        assert_eq!(mock.calls().len(), 2);
        assert_eq!(mock.calls()[0].1, "hola");
    }
}
