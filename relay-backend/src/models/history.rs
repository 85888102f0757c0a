use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a history entry relative to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inbound" => Some(Direction::Inbound),
            "outbound" => Some(Direction::Outbound),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a history entry. Notes never leave the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Message,
    Note,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Message => "message",
            EntryKind::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "message" => Some(EntryKind::Message),
            "note" => Some(EntryKind::Note),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery channel of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    MessagingApi,
    Email,
    Internal,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::MessagingApi => "messaging-api",
            ChannelKind::Email => "email",
            ChannelKind::Internal => "internal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "messaging-api" => Some(ChannelKind::MessagingApi),
            "email" => Some(ChannelKind::Email),
            "internal" => Some(ChannelKind::Internal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable unit of thread communication.
///
/// Entries are append-only: there is no update or delete path anywhere in
/// the codebase. Ordering is by `created_at`, ties broken by rowid
/// (insertion order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub thread_id: String,
    pub direction: Direction,
    pub kind: EntryKind,
    pub channel: ChannelKind,
    pub body: String,
    /// Subject line, email entries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Operator identifier for outbound entries, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_kind_round_trips() {
        for kind in [ChannelKind::MessagingApi, ChannelKind::Email, ChannelKind::Internal] {
            assert_eq!(ChannelKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ChannelKind::from_str("sms"), None);
    }

    #[test]
    fn direction_and_kind_round_trip() {
        assert_eq!(Direction::from_str("INBOUND"), Some(Direction::Inbound));
        assert_eq!(EntryKind::from_str("note"), Some(EntryKind::Note));
        assert_eq!(Direction::from_str("sideways"), None);
    }
}
