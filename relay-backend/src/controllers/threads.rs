use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::{CreateThreadRequest, HistoryEntry, Thread};
use crate::AppState;

#[derive(Serialize)]
pub struct ThreadsListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<Thread>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ThreadOperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<HistoryEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct ListThreadsQuery {
    pub owner: Option<String>,
}

#[derive(Deserialize)]
pub struct SetOwnerRequest {
    pub owner: Option<String>,
}

// Registered as flat routes: the dispatch and draft controllers add their
// own routes under /api/threads/{id}, which a scope here would shadow.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/threads", web::get().to(list_threads))
        .route("/api/threads", web::post().to(create_thread))
        .route("/api/threads/{id}", web::get().to(get_thread))
        .route("/api/threads/{id}/owner", web::put().to(set_owner))
        .route("/api/threads/{id}/history", web::get().to(get_history))
        .route("/api/threads/{id}/activate", web::post().to(activate_thread));
}

async fn list_threads(
    state: web::Data<AppState>,
    query: web::Query<ListThreadsQuery>,
) -> impl Responder {
    match state.db.list_threads(query.owner.as_deref()) {
        Ok(threads) => HttpResponse::Ok().json(ThreadsListResponse {
            success: true,
            threads: Some(threads),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to list threads: {}", e);
            HttpResponse::InternalServerError().json(ThreadsListResponse {
                success: false,
                threads: None,
                error: Some("Failed to retrieve threads".to_string()),
            })
        }
    }
}

async fn create_thread(
    state: web::Data<AppState>,
    body: web::Json<CreateThreadRequest>,
) -> impl Responder {
    match state.db.create_thread(&body) {
        Ok(thread) => HttpResponse::Ok().json(ThreadOperationResponse {
            success: true,
            thread: Some(thread),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to create thread: {}", e);
            HttpResponse::InternalServerError().json(ThreadOperationResponse {
                success: false,
                thread: None,
                error: Some("Failed to create thread".to_string()),
            })
        }
    }
}

async fn get_thread(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.db.get_thread(&id) {
        Ok(Some(thread)) => HttpResponse::Ok().json(ThreadOperationResponse {
            success: true,
            thread: Some(thread),
            error: None,
        }),
        Ok(None) => HttpResponse::NotFound().json(ThreadOperationResponse {
            success: false,
            thread: None,
            error: Some(format!("Thread {} not found", id)),
        }),
        Err(e) => {
            log::error!("Failed to get thread {}: {}", id, e);
            HttpResponse::InternalServerError().json(ThreadOperationResponse {
                success: false,
                thread: None,
                error: Some("Failed to retrieve thread".to_string()),
            })
        }
    }
}

async fn set_owner(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SetOwnerRequest>,
) -> impl Responder {
    let id = path.into_inner();
    match state.db.set_thread_owner(&id, body.owner.as_deref()) {
        Ok(true) => match state.db.get_thread(&id) {
            Ok(Some(thread)) => HttpResponse::Ok().json(ThreadOperationResponse {
                success: true,
                thread: Some(thread),
                error: None,
            }),
            _ => HttpResponse::InternalServerError().json(ThreadOperationResponse {
                success: false,
                thread: None,
                error: Some("Failed to reload thread".to_string()),
            }),
        },
        Ok(false) => HttpResponse::NotFound().json(ThreadOperationResponse {
            success: false,
            thread: None,
            error: Some(format!("Thread {} not found", id)),
        }),
        Err(e) => {
            log::error!("Failed to set owner for {}: {}", id, e);
            HttpResponse::InternalServerError().json(ThreadOperationResponse {
                success: false,
                thread: None,
                error: Some("Failed to update owner".to_string()),
            })
        }
    }
}

async fn get_history(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.db.list_history(&id) {
        Ok(entries) => HttpResponse::Ok().json(HistoryResponse {
            success: true,
            entries: Some(entries),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to load history for {}: {}", id, e);
            HttpResponse::InternalServerError().json(HistoryResponse {
                success: false,
                entries: None,
                error: Some("Failed to retrieve history".to_string()),
            })
        }
    }
}

/// Mark a thread as the operator's active thread. Cancels any draft still
/// pending for the previously active thread; in-flight dispatches are
/// never cancelled by a thread switch.
async fn activate_thread(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    state.draft_supervisor.set_active(&id);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "active_thread": id,
    }))
}
