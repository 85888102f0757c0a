use crate::gateway::protocol::{GatewayEvent, Severity};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fan-out of gateway events to connected UI clients.
///
/// Also the notification surface the dispatcher and draft controller use:
/// `notify` is fire-and-forget, no return value. Delivery is best-effort;
/// a client whose channel is closed or full is dropped on the next
/// broadcast rather than tracked separately.
pub struct EventBroadcaster {
    clients: DashMap<String, mpsc::Sender<GatewayEvent>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a client, returning its id and the receiving end of its
    /// event channel.
    pub fn subscribe(&self) -> (String, mpsc::Receiver<GatewayEvent>) {
        let client_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(100);
        self.clients.insert(client_id.clone(), tx);
        log::debug!("Gateway client {} subscribed", client_id);
        (client_id, rx)
    }

    pub fn unsubscribe(&self, client_id: &str) {
        self.clients.remove(client_id);
        log::debug!("Gateway client {} unsubscribed", client_id);
    }

    /// Send an event to every connected client, pruning any whose channel
    /// can no longer accept it.
    pub fn broadcast(&self, event: GatewayEvent) {
        self.clients.retain(|client_id, sender| {
            if sender.try_send(event.clone()).is_ok() {
                true
            } else {
                log::debug!("Dropping gateway client {}: channel closed or full", client_id);
                false
            }
        });
    }

    /// Fire-and-forget operator notification.
    pub fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.broadcast(GatewayEvent::notification(title, message, severity));
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
