use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::gateway::protocol::{GatewayEvent, Severity};
use crate::models::{ChannelKind, HistoryEntry};
use crate::AppState;

#[derive(Deserialize)]
pub struct InboundRequest {
    pub thread_id: String,
    #[serde(default)]
    pub channel: Option<String>,
    pub body: String,
}

#[derive(Serialize)]
pub struct InboundResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/inbound", web::post().to(record_inbound));
}

/// Webhook for customer messages arriving from the messaging provider.
/// Appends an inbound history entry and notifies connected operators.
async fn record_inbound(
    state: web::Data<AppState>,
    body: web::Json<InboundRequest>,
) -> impl Responder {
    if body.body.trim().is_empty() {
        return HttpResponse::BadRequest().json(InboundResponse {
            success: false,
            entry: None,
            error: Some("empty body".to_string()),
        });
    }

    let channel = body
        .channel
        .as_deref()
        .and_then(ChannelKind::from_str)
        .unwrap_or(ChannelKind::MessagingApi);

    match state.db.get_thread(&body.thread_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(InboundResponse {
                success: false,
                entry: None,
                error: Some(format!("Thread {} not found", body.thread_id)),
            });
        }
        Err(e) => {
            log::error!("Failed to load thread {}: {}", body.thread_id, e);
            return HttpResponse::InternalServerError().json(InboundResponse {
                success: false,
                entry: None,
                error: Some("Failed to load thread".to_string()),
            });
        }
    }

    match state.db.record_inbound(&body.thread_id, channel, body.body.trim()) {
        Ok(entry) => {
            state.broadcaster.broadcast(GatewayEvent::inbound_message(
                &body.thread_id,
                channel.as_str(),
                &entry.body,
            ));
            state
                .broadcaster
                .notify("New message", &entry.body, Severity::Info);
            HttpResponse::Ok().json(InboundResponse {
                success: true,
                entry: Some(entry),
                error: None,
            })
        }
        Err(e) => {
            log::error!("Failed to record inbound message: {}", e);
            HttpResponse::InternalServerError().json(InboundResponse {
                success: false,
                entry: None,
                error: Some("Failed to record message".to_string()),
            })
        }
    }
}
