use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event types for gateway broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Dispatch events
    DispatchDelivered,
    DispatchHandoff,
    DispatchFailed,
    // Draft events
    DraftReady,
    DraftFailed,
    // Inbound events
    InboundMessage,
    // Operator-facing notification surface
    Notification,
}

/// Severity of an operator-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DispatchDelivered => "dispatch.delivered",
            Self::DispatchHandoff => "dispatch.handoff",
            Self::DispatchFailed => "dispatch.failed",
            Self::DraftReady => "draft.ready",
            Self::DraftFailed => "draft.failed",
            Self::InboundMessage => "inbound.message",
            Self::Notification => "notification",
        }
    }
}

/// A single event pushed to connected gateway clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    fn new(event_type: EventType, data: Value) -> Self {
        Self {
            event: event_type.as_str().to_string(),
            data,
        }
    }

    pub fn dispatch_delivered(thread_id: &str, channel: &str, status: &str) -> Self {
        Self::new(
            EventType::DispatchDelivered,
            json!({
                "thread_id": thread_id,
                "channel": channel,
                "status": status,
            }),
        )
    }

    pub fn dispatch_handoff(thread_id: &str, handoff_url: &str, reason: &str) -> Self {
        Self::new(
            EventType::DispatchHandoff,
            json!({
                "thread_id": thread_id,
                "handoff_url": handoff_url,
                "reason": reason,
            }),
        )
    }

    pub fn dispatch_failed(thread_id: &str, channel: &str, reason: &str) -> Self {
        Self::new(
            EventType::DispatchFailed,
            json!({
                "thread_id": thread_id,
                "channel": channel,
                "reason": reason,
            }),
        )
    }

    pub fn draft_ready(thread_id: &str, draft: &str) -> Self {
        Self::new(
            EventType::DraftReady,
            json!({
                "thread_id": thread_id,
                "draft": draft,
            }),
        )
    }

    pub fn draft_failed(thread_id: &str, reason: &str) -> Self {
        Self::new(
            EventType::DraftFailed,
            json!({
                "thread_id": thread_id,
                "reason": reason,
            }),
        )
    }

    pub fn inbound_message(thread_id: &str, channel: &str, body: &str) -> Self {
        Self::new(
            EventType::InboundMessage,
            json!({
                "thread_id": thread_id,
                "channel": channel,
                "body": body,
            }),
        )
    }

    pub fn notification(title: &str, message: &str, severity: Severity) -> Self {
        Self::new(
            EventType::Notification,
            json!({
                "title": title,
                "message": message,
                "severity": severity.as_str(),
            }),
        )
    }
}
