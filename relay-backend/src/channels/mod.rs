pub mod dispatcher;
pub mod email;
pub mod fallback;
pub mod messaging_api;
pub mod note;
pub mod types;

#[cfg(test)]
mod dispatcher_tests;

pub use dispatcher::MessageDispatcher;
pub use types::{DispatchMode, DispatchOutcome, DispatchRequest, DispatchStatus};

use async_trait::async_trait;
use types::AttemptError;

/// One delivery attempt for one channel. Implementations know what
/// "success" means for their channel; they never touch persistence.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    async fn attempt(&self, destination: &str, body: &str) -> Result<(), AttemptError>;
}
