use serde::{Deserialize, Serialize};

use crate::models::{ChannelKind, HistoryEntry};

/// What the operator is composing: an outward message or an internal note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    Message,
    Note,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Message => "message",
            DispatchMode::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "message" => Some(DispatchMode::Message),
            "note" => Some(DispatchMode::Note),
            _ => None,
        }
    }
}

/// Failure classes for a channel-level send attempt.
///
/// `NotConfigured` and `Rejected` are recoverable for the messaging-API
/// channel (they trigger the hand-off fallback); `Transport` never is.
/// The distinction between the two recoverable classes only feeds the
/// diagnostic string shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    NotConfigured,
    Rejected(String),
    Transport(String),
}

impl AttemptError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AttemptError::NotConfigured | AttemptError::Rejected(_))
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::NotConfigured => write!(f, "channel not configured"),
            AttemptError::Rejected(reason) => write!(f, "send rejected: {}", reason),
            AttemptError::Transport(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

/// Terminal classification of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchStatus {
    DeliveredViaApi,
    DeliveredViaHandoff,
    PersistedOnly,
    Failed,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::DeliveredViaApi => "delivered-via-api",
            DispatchStatus::DeliveredViaHandoff => "delivered-via-handoff",
            DispatchStatus::PersistedOnly => "persisted-only",
            DispatchStatus::Failed => "failed",
        }
    }

    pub fn is_delivered(&self) -> bool {
        !matches!(self, DispatchStatus::Failed)
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ephemeral input to the orchestrator. Consumed once, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    pub mode: DispatchMode,
    pub channel: ChannelKind,
    pub body: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Result of one dispatch attempt, returned synchronously to the caller.
///
/// The hand-off/api distinction lives only here; persisted history records
/// both the same way.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Deep link the UI should open when status is delivered-via-handoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<HistoryEntry>,
}

impl DispatchOutcome {
    pub fn delivered(status: DispatchStatus, entry: HistoryEntry) -> Self {
        Self {
            status,
            reason: None,
            handoff_url: None,
            entry: Some(entry),
        }
    }

    pub fn handoff(entry: HistoryEntry, handoff_url: String, reason: String) -> Self {
        Self {
            status: DispatchStatus::DeliveredViaHandoff,
            reason: Some(reason),
            handoff_url: Some(handoff_url),
            entry: Some(entry),
        }
    }

    pub fn failed(reason: String) -> Self {
        Self {
            status: DispatchStatus::Failed,
            reason: Some(reason),
            handoff_url: None,
            entry: None,
        }
    }
}

/// Compose-session state machine, one per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeState {
    Idle,
    Composing,
    Dispatching,
    Delivered,
    Failed,
}

/// Explicit per-thread compose session. Replaces ambient UI globals: the
/// orchestrator owns one of these per thread and mutates it only under the
/// thread's dispatch lock.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeSession {
    pub thread_id: String,
    pub state: ComposeState,
    pub body: String,
    pub subject: String,
    pub mode: DispatchMode,
    pub channel: ChannelKind,
}

impl ComposeSession {
    pub fn new(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            state: ComposeState::Idle,
            body: String::new(),
            subject: String::new(),
            mode: DispatchMode::Message,
            channel: ChannelKind::MessagingApi,
        }
    }
}
