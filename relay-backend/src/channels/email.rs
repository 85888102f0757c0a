use async_trait::async_trait;

use crate::channels::types::AttemptError;
use crate::channels::ChannelAdapter;

/// Email channel: there is no live send path in this design, delivery is
/// the history append itself. Subject validation happens in the
/// orchestrator before any attempt is made, so this adapter always
/// reports local success.
pub struct EmailAdapter;

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    async fn attempt(&self, _destination: &str, _body: &str) -> Result<(), AttemptError> {
        Ok(())
    }
}
