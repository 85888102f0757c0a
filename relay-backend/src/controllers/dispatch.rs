use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::channels::types::ComposeSession;
use crate::channels::{DispatchOutcome, DispatchRequest};
use crate::AppState;

#[derive(Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub outcome: DispatchOutcome,
}

#[derive(Serialize)]
pub struct ComposeSessionResponse {
    pub success: bool,
    pub session: ComposeSession,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/threads/{id}/dispatch", web::post().to(dispatch))
        .route("/api/threads/{id}/compose", web::get().to(compose_session));
}

/// Dispatch an operator-authored message or internal note. The outcome is
/// returned synchronously; delivery/hand-off/failure events also go out on
/// the gateway.
async fn dispatch(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<DispatchRequest>,
) -> impl Responder {
    let thread_id = path.into_inner();
    let outcome = state
        .dispatcher
        .dispatch(&thread_id, body.into_inner())
        .await;

    HttpResponse::Ok().json(DispatchResponse {
        success: outcome.status.is_delivered(),
        outcome,
    })
}

/// Inspect the compose session for a thread (state machine position plus
/// any preserved buffer after a failed dispatch).
async fn compose_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let thread_id = path.into_inner();
    HttpResponse::Ok().json(ComposeSessionResponse {
        success: true,
        session: state.dispatcher.compose_session(&thread_id),
    })
}
