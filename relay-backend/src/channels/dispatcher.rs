use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::channels::email::EmailAdapter;
use crate::channels::fallback::{FallbackCoordinator, FallbackDecision};
use crate::channels::messaging_api::{MessagingApiAdapter, MessagingTransport};
use crate::channels::note::InternalNoteAdapter;
use crate::channels::types::{
    ComposeSession, ComposeState, DispatchMode, DispatchOutcome, DispatchRequest, DispatchStatus,
};
use crate::channels::ChannelAdapter;
use crate::db::Database;
use crate::gateway::events::EventBroadcaster;
use crate::gateway::protocol::{GatewayEvent, Severity};
use crate::models::{ChannelKind, Direction, EntryKind, Thread};

/// Orchestrates one operator action end to end: adapter attempt, fallback
/// classification, history append, notification. Per-thread dispatches are
/// serialized; different threads proceed concurrently.
pub struct MessageDispatcher {
    db: Arc<Database>,
    broadcaster: Arc<EventBroadcaster>,
    messaging: MessagingApiAdapter,
    email: EmailAdapter,
    note: InternalNoteAdapter,
    fallback: FallbackCoordinator,
    compose_sessions: DashMap<String, ComposeSession>,
    dispatch_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MessageDispatcher {
    pub fn new(
        db: Arc<Database>,
        broadcaster: Arc<EventBroadcaster>,
        transport: MessagingTransport,
        handoff_base: &str,
    ) -> Self {
        Self {
            db,
            broadcaster,
            messaging: MessagingApiAdapter::new(transport),
            email: EmailAdapter,
            note: InternalNoteAdapter,
            fallback: FallbackCoordinator::new(handoff_base),
            compose_sessions: DashMap::new(),
            dispatch_locks: DashMap::new(),
        }
    }

    /// Current compose session for a thread (idle if none exists yet).
    pub fn compose_session(&self, thread_id: &str) -> ComposeSession {
        self.compose_sessions
            .get(thread_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| ComposeSession::new(thread_id))
    }

    fn adapter(&self, channel: ChannelKind) -> &dyn ChannelAdapter {
        match channel {
            ChannelKind::MessagingApi => &self.messaging,
            ChannelKind::Email => &self.email,
            ChannelKind::Internal => &self.note,
        }
    }

    fn dispatch_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.dispatch_locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn set_session(&self, thread_id: &str, update: impl FnOnce(&mut ComposeSession)) {
        let mut session = self
            .compose_sessions
            .entry(thread_id.to_string())
            .or_insert_with(|| ComposeSession::new(thread_id));
        update(session.value_mut());
    }

    /// Dispatch an operator-authored message or note on a thread.
    ///
    /// State machine: idle -> composing -> dispatching -> delivered | failed.
    /// Validation rejections (empty body, missing email subject, missing
    /// phone contact) happen before any attempt and leave the session in
    /// `composing` with the buffer intact.
    pub async fn dispatch(&self, thread_id: &str, request: DispatchRequest) -> DispatchOutcome {
        let thread = match self.db.get_thread(thread_id) {
            Ok(Some(thread)) => thread,
            Ok(None) => {
                return DispatchOutcome::failed(format!("unknown thread: {}", thread_id));
            }
            Err(e) => {
                log::error!("[DISPATCH] thread lookup failed: {}", e);
                return DispatchOutcome::failed(format!("storage error: {}", e));
            }
        };

        // The session is only touched under the thread's dispatch lock, so
        // a concurrent submission cannot overwrite an in-flight dispatch's
        // buffer mid-delivery.
        let lock = self.dispatch_lock(thread_id);
        let _guard = lock.lock().await;

        // The next user action resets any terminal state back through
        // composing, carrying the freshly submitted buffer.
        self.set_session(thread_id, |s| {
            s.state = ComposeState::Composing;
            s.body = request.body.clone();
            s.subject = request.subject.clone().unwrap_or_default();
            s.mode = request.mode;
            s.channel = request.channel;
        });

        // Notes always target the internal channel, regardless of the
        // channel selected in the UI before switching to note mode.
        let channel = if request.mode == DispatchMode::Note {
            ChannelKind::Internal
        } else {
            request.channel
        };

        if let Some(reason) = self.validate(&thread, &request, channel) {
            // Rejected without transition; no attempt, no history entry.
            log::info!("[DISPATCH] rejected for thread {}: {}", thread_id, reason);
            return DispatchOutcome::failed(reason);
        }

        self.set_session(thread_id, |s| s.state = ComposeState::Dispatching);

        let destination = match channel {
            ChannelKind::MessagingApi => thread.phone.clone().unwrap_or_default(),
            ChannelKind::Email => thread.email.clone().unwrap_or_default(),
            ChannelKind::Internal => String::new(),
        };
        let body = request.body.trim().to_string();

        let attempt = self.adapter(channel).attempt(&destination, &body).await;

        let (status, reason, handoff_url) = match attempt {
            Ok(()) => {
                let status = match channel {
                    ChannelKind::MessagingApi => DispatchStatus::DeliveredViaApi,
                    // Email delivery is the history append itself; notes
                    // never touch an outward channel.
                    ChannelKind::Email | ChannelKind::Internal => DispatchStatus::PersistedOnly,
                };
                (status, None, None)
            }
            Err(err) => match self.fallback.resolve(channel, &destination, &body, &err) {
                FallbackDecision::Handoff { url, reason } => {
                    (DispatchStatus::DeliveredViaHandoff, Some(reason), Some(url))
                }
                FallbackDecision::Fail { reason } => {
                    return self.fail(thread_id, channel, reason);
                }
            },
        };

        // Exactly one history entry per successful dispatch, hand-off and
        // API delivery recorded identically. No entry means not sent.
        let subject = if channel == ChannelKind::Email {
            request.subject.as_deref()
        } else {
            None
        };
        let kind = match request.mode {
            DispatchMode::Message => EntryKind::Message,
            DispatchMode::Note => EntryKind::Note,
        };
        let entry = match self.db.append_history(
            thread_id,
            Direction::Outbound,
            kind,
            channel,
            &body,
            subject,
            thread.owner.as_deref(),
        ) {
            Ok(entry) => entry,
            Err(e) => {
                // Channel-level success without an audit trail is reported
                // as failed; history is the source of truth for "sent".
                log::error!("[DISPATCH] history append failed: {}", e);
                return self.fail(thread_id, channel, format!("history append failed: {}", e));
            }
        };

        // Delivered: clear the compose buffer and reset note mode.
        self.set_session(thread_id, |s| {
            s.state = ComposeState::Delivered;
            s.body.clear();
            s.subject.clear();
            s.mode = DispatchMode::Message;
        });

        log::info!(
            "[DISPATCH] thread {} {} entry {} ({})",
            thread_id,
            status,
            entry.id,
            channel
        );

        match status {
            DispatchStatus::DeliveredViaHandoff => {
                let url = handoff_url.clone().unwrap_or_default();
                let why = reason.clone().unwrap_or_default();
                self.broadcaster
                    .broadcast(GatewayEvent::dispatch_handoff(thread_id, &url, &why));
                self.broadcaster.notify(
                    "Hand-off ready",
                    "Opened external composer; delivery was not confirmed",
                    Severity::Warning,
                );
                DispatchOutcome::handoff(entry, url, why)
            }
            _ => {
                self.broadcaster.broadcast(GatewayEvent::dispatch_delivered(
                    thread_id,
                    channel.as_str(),
                    status.as_str(),
                ));
                let title = match kind {
                    EntryKind::Note => "Note saved",
                    EntryKind::Message => "Message sent",
                };
                self.broadcaster.notify(title, &body, Severity::Info);
                DispatchOutcome::delivered(status, entry)
            }
        }
    }

    /// Pre-attempt validation. Returns a rejection reason, leaving the
    /// session in `composing` so the operator keeps the drafted text.
    fn validate(
        &self,
        thread: &Thread,
        request: &DispatchRequest,
        channel: ChannelKind,
    ) -> Option<String> {
        if request.body.trim().is_empty() {
            return Some("empty body".to_string());
        }
        match channel {
            ChannelKind::Email => {
                let subject_empty = request
                    .subject
                    .as_deref()
                    .map(|s| s.trim().is_empty())
                    .unwrap_or(true);
                if request.mode == DispatchMode::Message && subject_empty {
                    return Some("email requires a subject".to_string());
                }
                if thread.email.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Some("thread has no email contact".to_string());
                }
            }
            ChannelKind::MessagingApi => {
                let digits: String = thread
                    .phone
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect();
                if digits.is_empty() {
                    return Some("thread has no phone contact".to_string());
                }
            }
            ChannelKind::Internal => {}
        }
        None
    }

    /// Terminal failure: keep the compose buffer so the operator does not
    /// lose drafted text, surface a notification, report failed.
    fn fail(&self, thread_id: &str, channel: ChannelKind, reason: String) -> DispatchOutcome {
        self.set_session(thread_id, |s| s.state = ComposeState::Failed);
        log::warn!("[DISPATCH] thread {} failed: {}", thread_id, reason);
        self.broadcaster.broadcast(GatewayEvent::dispatch_failed(
            thread_id,
            channel.as_str(),
            &reason,
        ));
        self.broadcaster.notify("Send failed", &reason, Severity::Error);
        DispatchOutcome::failed(reason)
    }
}
