use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::models::{KnowledgeItem, UpsertKnowledgeRequest};
use crate::AppState;

#[derive(Serialize)]
pub struct KnowledgeListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<KnowledgeItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct KnowledgeOperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<KnowledgeItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/knowledge")
            .route("", web::get().to(list_items))
            .route("", web::post().to(upsert_item)),
    );
}

async fn list_items(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_knowledge_items() {
        Ok(items) => HttpResponse::Ok().json(KnowledgeListResponse {
            success: true,
            items: Some(items),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to list knowledge items: {}", e);
            HttpResponse::InternalServerError().json(KnowledgeListResponse {
                success: false,
                items: None,
                error: Some("Failed to retrieve knowledge items".to_string()),
            })
        }
    }
}

async fn upsert_item(
    state: web::Data<AppState>,
    body: web::Json<UpsertKnowledgeRequest>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(KnowledgeOperationResponse {
            success: false,
            item: None,
            error: Some("name is required".to_string()),
        });
    }

    match state.db.upsert_knowledge_item(&body) {
        Ok(item) => HttpResponse::Ok().json(KnowledgeOperationResponse {
            success: true,
            item: Some(item),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to upsert knowledge item: {}", e);
            HttpResponse::InternalServerError().json(KnowledgeOperationResponse {
                success: false,
                item: None,
                error: Some("Failed to save knowledge item".to_string()),
            })
        }
    }
}
