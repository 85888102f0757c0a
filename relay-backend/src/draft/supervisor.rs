use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::draft::types::DraftError;
use crate::draft::DraftClient;

/// Supervises in-flight draft generation with per-thread cancellation.
///
/// Switching the active thread cancels the previous thread's pending draft;
/// a result that resolves after cancellation is discarded, never applied to
/// a compose buffer. Dispatch is deliberately outside this supervisor: an
/// in-flight dispatch always runs to completion.
pub struct DraftSupervisor {
    tokens: DashMap<String, (u64, CancellationToken)>,
    seq: AtomicU64,
    active_thread: Mutex<Option<String>>,
}

impl DraftSupervisor {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
            seq: AtomicU64::new(0),
            active_thread: Mutex::new(None),
        }
    }

    /// Mark a thread as the operator's active thread, cancelling any draft
    /// still pending for the previously active one.
    pub fn set_active(&self, thread_id: &str) {
        let previous = {
            let mut active = self.active_thread.lock().unwrap();
            active.replace(thread_id.to_string())
        };
        if let Some(previous) = previous {
            if previous != thread_id {
                self.cancel(&previous);
            }
        }
    }

    pub fn active_thread(&self) -> Option<String> {
        self.active_thread.lock().unwrap().clone()
    }

    /// Register a new draft for a thread. A draft already pending for the
    /// same thread is cancelled and replaced.
    pub fn begin(&self, thread_id: &str) -> CancellationToken {
        let (_, token) = self.begin_registered(thread_id);
        token
    }

    fn begin_registered(&self, thread_id: &str) -> (u64, CancellationToken) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.tokens.insert(thread_id.to_string(), (seq, token.clone())) {
            previous.cancel();
        }
        (seq, token)
    }

    /// Cancel the pending draft for a thread, if any.
    pub fn cancel(&self, thread_id: &str) {
        if let Some((_, (_, token))) = self.tokens.remove(thread_id) {
            log::info!("[DRAFT] cancelled pending draft for thread {}", thread_id);
            token.cancel();
        }
    }

    /// Drop a registration, but only if a newer draft has not replaced it.
    fn finish(&self, thread_id: &str, seq: u64) {
        self.tokens
            .remove_if(thread_id, |_, (registered, _)| *registered == seq);
    }

    /// Run one draft generation under this thread's cancellation token.
    pub async fn generate(
        &self,
        thread_id: &str,
        client: &DraftClient,
        prompt: &str,
    ) -> Result<Option<String>, DraftError> {
        let (seq, token) = self.begin_registered(thread_id);

        let result = tokio::select! {
            _ = token.cancelled() => Err(DraftError::Cancelled),
            result = client.generate(prompt) => result,
        };

        self.finish(thread_id, seq);

        if token.is_cancelled() {
            // Late result after cancellation: discard.
            return Err(DraftError::Cancelled);
        }
        result
    }
}

impl Default for DraftSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
