pub mod dispatch;
pub mod drafts;
pub mod health;
pub mod inbound;
pub mod knowledge;
pub mod threads;
