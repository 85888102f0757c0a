//! Integration tests for the dispatch orchestrator's core invariants:
//! exactly one history entry per successful dispatch, channel-specific
//! fallback behavior, and compose-session state transitions.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::channels::dispatcher::MessageDispatcher;
use crate::channels::messaging_api::{MessagingTransport, MockTransport};
use crate::channels::types::{
    AttemptError, ComposeState, DispatchMode, DispatchOutcome, DispatchRequest, DispatchStatus,
};
use crate::db::Database;
use crate::gateway::events::EventBroadcaster;
use crate::gateway::protocol::GatewayEvent;
use crate::models::{ChannelKind, CreateThreadRequest, Direction, EntryKind};

/// Test harness wiring an in-memory database, an event subscriber and a
/// dispatcher backed by a mock messaging transport.
struct TestHarness {
    db: Arc<Database>,
    dispatcher: Arc<MessageDispatcher>,
    transport: MockTransport,
    _client_id: String,
    event_rx: mpsc::Receiver<GatewayEvent>,
    thread_id: String,
}

impl TestHarness {
    fn new(transport_results: Vec<Result<(), AttemptError>>) -> Self {
        Self::build(MockTransport::new(transport_results))
    }

    fn build(transport: MockTransport) -> Self {
        let db = Arc::new(Database::new(":memory:").expect("in-memory db"));

        let thread = db
            .create_thread(&CreateThreadRequest {
                owner: Some("ana".to_string()),
                phone: Some("+34 600-11-22-33".to_string()),
                email: Some("customer@example.test".to_string()),
                source: Some("facebook".to_string()),
                campaign: None,
                term: None,
                tags: vec![],
            })
            .expect("create thread");

        let broadcaster = Arc::new(EventBroadcaster::new());
        let (client_id, event_rx) = broadcaster.subscribe();

        let dispatcher = Arc::new(MessageDispatcher::new(
            db.clone(),
            broadcaster,
            MessagingTransport::Mock(transport.clone()),
            "https://wa.me",
        ));

        TestHarness {
            db,
            dispatcher,
            transport,
            _client_id: client_id,
            event_rx,
            thread_id: thread.id,
        }
    }

    async fn dispatch(
        &self,
        mode: DispatchMode,
        channel: ChannelKind,
        body: &str,
        subject: Option<&str>,
    ) -> DispatchOutcome {
        self.dispatcher
            .dispatch(
                &self.thread_id,
                DispatchRequest {
                    mode,
                    channel,
                    body: body.to_string(),
                    subject: subject.map(String::from),
                },
            )
            .await
    }

    fn drain_events(&mut self) -> Vec<GatewayEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn event_names(&mut self) -> Vec<String> {
        self.drain_events().into_iter().map(|e| e.event).collect()
    }
}

#[tokio::test]
async fn api_success_writes_exactly_one_outbound_entry() {
    let mut h = TestHarness::new(vec![Ok(())]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "Hola", None)
        .await;

    assert_eq!(outcome.status, DispatchStatus::DeliveredViaApi);
    let entry = outcome.entry.expect("entry written");
    assert_eq!(entry.direction, Direction::Outbound);
    assert_eq!(entry.kind, EntryKind::Message);
    assert_eq!(entry.channel, ChannelKind::MessagingApi);
    assert_eq!(entry.body, "Hola");
    assert_eq!(entry.author.as_deref(), Some("ana"));

    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 1);
    // Destination reached the transport normalized to digits only
    assert_eq!(h.transport.calls(), vec![("34600112233".to_string(), "Hola".to_string())]);

    let names = h.event_names();
    assert!(names.contains(&"dispatch.delivered".to_string()));
    assert!(names.contains(&"notification".to_string()));
}

#[tokio::test]
async fn not_configured_falls_back_to_handoff_and_still_persists() {
    let mut h = TestHarness::new(vec![Err(AttemptError::NotConfigured)]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "hola, ¿precio?", None)
        .await;

    assert_eq!(outcome.status, DispatchStatus::DeliveredViaHandoff);
    let url = outcome.handoff_url.expect("handoff url");
    assert_eq!(url, "https://wa.me/34600112233?text=hola%2C%20%C2%BFprecio%3F");
    assert_eq!(outcome.reason.as_deref(), Some("channel not configured"));

    // Hand-off is recorded identically to API delivery
    let entry = outcome.entry.expect("entry written");
    assert_eq!(entry.channel, ChannelKind::MessagingApi);
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 1);

    assert!(h.event_names().contains(&"dispatch.handoff".to_string()));
}

#[tokio::test]
async fn rejected_send_falls_back_to_handoff() {
    let h = TestHarness::new(vec![Err(AttemptError::Rejected(
        "messaging window closed".to_string(),
    ))]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "Hola", None)
        .await;

    assert_eq!(outcome.status, DispatchStatus::DeliveredViaHandoff);
    assert_eq!(
        outcome.reason.as_deref(),
        Some("send rejected: messaging window closed")
    );
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 1);
}

#[tokio::test]
async fn transport_error_fails_with_no_history_entry() {
    let mut h = TestHarness::new(vec![Err(AttemptError::Transport(
        "connection reset".to_string(),
    ))]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "Hola", None)
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert!(outcome.entry.is_none());
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 0);

    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Failed);
    // Failed dispatch preserves the compose buffer
    assert_eq!(session.body, "Hola");

    assert!(h.event_names().contains(&"dispatch.failed".to_string()));
}

#[tokio::test]
async fn note_is_persisted_only_on_internal_channel() {
    let h = TestHarness::new(vec![]);

    // Channel selected in the UI before switching to note mode is ignored
    let outcome = h
        .dispatch(
            DispatchMode::Note,
            ChannelKind::MessagingApi,
            "Llamar mañana",
            None,
        )
        .await;

    assert_eq!(outcome.status, DispatchStatus::PersistedOnly);
    let entry = outcome.entry.expect("entry written");
    assert_eq!(entry.kind, EntryKind::Note);
    assert_eq!(entry.channel, ChannelKind::Internal);

    // The note never reached the outward transport
    assert!(h.transport.calls().is_empty());

    // Mode toggle resets to message after a delivered note
    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.mode, DispatchMode::Message);
    assert_eq!(session.state, ComposeState::Delivered);
    assert!(session.body.is_empty());
}

#[tokio::test]
async fn email_with_empty_subject_is_rejected_before_attempt() {
    let h = TestHarness::new(vec![]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::Email, "Hi", Some(""))
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert_eq!(outcome.reason.as_deref(), Some("email requires a subject"));
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 0);

    // Rejected without transition: session stays in composing
    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Composing);
    assert_eq!(session.body, "Hi");
}

#[tokio::test]
async fn email_with_subject_is_persisted_only() {
    let h = TestHarness::new(vec![]);

    let outcome = h
        .dispatch(
            DispatchMode::Message,
            ChannelKind::Email,
            "Adjunto el presupuesto",
            Some("Presupuesto"),
        )
        .await;

    assert_eq!(outcome.status, DispatchStatus::PersistedOnly);
    let entry = outcome.entry.expect("entry written");
    assert_eq!(entry.channel, ChannelKind::Email);
    assert_eq!(entry.subject.as_deref(), Some("Presupuesto"));
}

#[tokio::test]
async fn empty_body_is_rejected_without_transition() {
    let h = TestHarness::new(vec![]);

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "   ", None)
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert_eq!(outcome.reason.as_deref(), Some("empty body"));
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 0);
    assert!(h.transport.calls().is_empty());

    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Composing);
}

#[tokio::test]
async fn unknown_thread_fails_cleanly() {
    let h = TestHarness::new(vec![]);

    let outcome = h
        .dispatcher
        .dispatch(
            "no-such-thread",
            DispatchRequest {
                mode: DispatchMode::Message,
                channel: ChannelKind::MessagingApi,
                body: "Hola".to_string(),
                subject: None,
            },
        )
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert!(outcome.entry.is_none());
}

#[tokio::test]
async fn successful_dispatch_clears_compose_buffer() {
    let h = TestHarness::new(vec![Ok(())]);

    h.dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "Hola", None)
        .await;

    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Delivered);
    assert!(session.body.is_empty());
    assert!(session.subject.is_empty());
}

#[tokio::test]
async fn exactly_one_entry_per_successful_dispatch() {
    let h = TestHarness::new(vec![Ok(()), Err(AttemptError::NotConfigured), Ok(())]);

    for body in ["uno", "dos", "tres"] {
        let outcome = h
            .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, body, None)
            .await;
        assert!(outcome.status.is_delivered());
    }

    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 3);
    let bodies: Vec<String> = h
        .db
        .list_history(&h.thread_id)
        .unwrap()
        .into_iter()
        .map(|e| e.body)
        .collect();
    assert_eq!(bodies, vec!["uno", "dos", "tres"]);
}

#[tokio::test]
async fn dispatches_to_different_threads_run_independently() {
    let h = TestHarness::new(vec![Ok(()), Ok(())]);

    let other = h
        .db
        .create_thread(&CreateThreadRequest {
            owner: None,
            phone: Some("600999888".to_string()),
            email: None,
            source: None,
            campaign: None,
            term: None,
            tags: vec![],
        })
        .unwrap();

    let d1 = h.dispatcher.clone();
    let t1 = h.thread_id.clone();
    let first = tokio::spawn(async move {
        d1.dispatch(
            &t1,
            DispatchRequest {
                mode: DispatchMode::Message,
                channel: ChannelKind::MessagingApi,
                body: "para el primero".to_string(),
                subject: None,
            },
        )
        .await
    });

    let d2 = h.dispatcher.clone();
    let t2 = other.id.clone();
    let second = tokio::spawn(async move {
        d2.dispatch(
            &t2,
            DispatchRequest {
                mode: DispatchMode::Message,
                channel: ChannelKind::MessagingApi,
                body: "para el segundo".to_string(),
                subject: None,
            },
        )
        .await
    });

    let (first, second) = (first.await.unwrap(), second.await.unwrap());
    assert_eq!(first.status, DispatchStatus::DeliveredViaApi);
    assert_eq!(second.status, DispatchStatus::DeliveredViaApi);
    assert_eq!(h.db.count_history(&h.thread_id).unwrap(), 1);
    assert_eq!(h.db.count_history(&other.id).unwrap(), 1);
}

#[tokio::test]
async fn same_thread_dispatches_serialize_under_contention() {
    let (transport, gate) = MockTransport::gated(vec![Ok(()), Ok(())]);
    let h = TestHarness::build(transport);

    let d1 = h.dispatcher.clone();
    let t1 = h.thread_id.clone();
    let first = tokio::spawn(async move {
        d1.dispatch(
            &t1,
            DispatchRequest {
                mode: DispatchMode::Message,
                channel: ChannelKind::MessagingApi,
                body: "primero".to_string(),
                subject: None,
            },
        )
        .await
    });

    // Wait until the first send is parked inside the transport
    for _ in 0..200 {
        if !h.transport.calls().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(h.transport.calls().len(), 1);

    let d2 = h.dispatcher.clone();
    let t2 = h.thread_id.clone();
    let second = tokio::spawn(async move {
        d2.dispatch(
            &t2,
            DispatchRequest {
                mode: DispatchMode::Message,
                channel: ChannelKind::MessagingApi,
                body: "segundo".to_string(),
                subject: None,
            },
        )
        .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // The second dispatch is held at the thread lock: it has not reached
    // the transport, and the in-flight session still carries the first
    // submission's buffer.
    assert_eq!(h.transport.calls().len(), 1);
    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Dispatching);
    assert_eq!(session.body, "primero");

    gate.add_permits(2);
    let (first, second) = (first.await.unwrap(), second.await.unwrap());
    assert_eq!(first.status, DispatchStatus::DeliveredViaApi);
    assert_eq!(second.status, DispatchStatus::DeliveredViaApi);

    // Entries land in initiation order: the second observed the first's
    // entry before appending its own
    let bodies: Vec<String> = h
        .db
        .list_history(&h.thread_id)
        .unwrap()
        .into_iter()
        .map(|e| e.body)
        .collect();
    assert_eq!(bodies, vec!["primero", "segundo"]);
}

#[tokio::test]
async fn history_append_failure_overrides_send_success() {
    let mut h = TestHarness::new(vec![Ok(())]);

    // Break the history table so the append after a successful send fails
    h.db.conn
        .lock()
        .unwrap()
        .execute("DROP TABLE history", [])
        .unwrap();

    let outcome = h
        .dispatch(DispatchMode::Message, ChannelKind::MessagingApi, "Hola", None)
        .await;

    // The send reached the transport, but no entry means not sent
    assert_eq!(h.transport.calls().len(), 1);
    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert!(outcome.entry.is_none());
    assert!(outcome
        .reason
        .as_deref()
        .unwrap()
        .contains("history append failed"));

    let session = h.dispatcher.compose_session(&h.thread_id);
    assert_eq!(session.state, ComposeState::Failed);
    assert_eq!(session.body, "Hola");

    assert!(h.event_names().contains(&"dispatch.failed".to_string()));
}
