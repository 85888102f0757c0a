use serde::{Deserialize, Serialize};

/// Read-only product/service catalog entry consumed by the draft context
/// builder. The engine never mutates these beyond the collaborator CRUD
/// endpoint that maintains the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertKnowledgeRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub description: String,
}
