pub mod history;
pub mod knowledge;
pub mod thread;

pub use history::{ChannelKind, Direction, EntryKind, HistoryEntry};
pub use knowledge::{KnowledgeItem, UpsertKnowledgeRequest};
pub use thread::{Attribution, CreateThreadRequest, Thread};
