use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lead-attribution metadata captured when the thread was created.
///
/// All fields are optional; the draft context builder substitutes "N/A"
/// for missing values so the prompt shape stays stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attribution {
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One customer conversation with a single canonical ordered history.
///
/// The owner is mutable (threads can be reassigned between operators);
/// history is append-only and lives in the `history` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Phone-based contact reference for the messaging-API channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Email contact reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub attribution: Attribution,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub owner: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
