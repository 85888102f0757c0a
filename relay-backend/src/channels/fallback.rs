use crate::channels::messaging_api::normalize_destination;
use crate::channels::types::AttemptError;
use crate::models::ChannelKind;

/// What the coordinator decided to do with a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Open an external composer; recorded optimistically as delivered.
    /// Completion of the hand-off is never observed.
    Handoff { url: String, reason: String },
    /// Terminal failure, no fallback path.
    Fail { reason: String },
}

/// Per-channel fallback policy around a channel adapter attempt.
///
/// Only the messaging-API channel has a fallback: recoverable failures
/// (not configured, send rejected) hand off to an external composer via a
/// deep link. Transport failures, and failures on any other channel, are
/// terminal.
pub struct FallbackCoordinator {
    handoff_base: String,
}

impl FallbackCoordinator {
    pub fn new(handoff_base: &str) -> Self {
        Self {
            handoff_base: handoff_base.trim_end_matches('/').to_string(),
        }
    }

    /// Deep link encoding destination digits + body.
    pub fn handoff_url(&self, destination: &str, body: &str) -> String {
        format!(
            "{}/{}?text={}",
            self.handoff_base,
            normalize_destination(destination),
            urlencoding::encode(body)
        )
    }

    pub fn resolve(
        &self,
        channel: ChannelKind,
        destination: &str,
        body: &str,
        error: &AttemptError,
    ) -> FallbackDecision {
        if channel == ChannelKind::MessagingApi && error.is_recoverable() {
            log::info!("[HANDOFF] {} -> external composer", error);
            return FallbackDecision::Handoff {
                url: self.handoff_url(destination, body),
                reason: error.to_string(),
            };
        }
        FallbackDecision::Fail {
            reason: error.to_string(),
        }
    }
}
