use async_trait::async_trait;

use crate::channels::types::AttemptError;
use crate::channels::ChannelAdapter;

/// Internal notes never leave the system: always a local success, always
/// persisted-only, never delivered toward the customer.
pub struct InternalNoteAdapter;

#[async_trait]
impl ChannelAdapter for InternalNoteAdapter {
    async fn attempt(&self, _destination: &str, _body: &str) -> Result<(), AttemptError> {
        Ok(())
    }
}
