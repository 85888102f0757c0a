//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod history; // history (append-only conversation log)
mod knowledge; // knowledge_items (draft grounding catalog)
mod threads; // threads (customer conversations)
