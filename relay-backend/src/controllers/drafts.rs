use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::draft::{build_prompt, DraftClient, DraftError, DraftProvider, PromptOptions, ProviderConfig};
use crate::gateway::protocol::{GatewayEvent, Severity};
use crate::AppState;

#[derive(Deserialize)]
pub struct DraftRequestBody {
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Optional cap on how many history turns feed the prompt.
    #[serde(default)]
    pub max_turns: Option<usize>,
}

#[derive(Serialize)]
pub struct DraftResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DraftResponse {
    fn ok(draft: Option<String>) -> Self {
        Self {
            success: true,
            draft,
            cancelled: false,
            error: None,
        }
    }

    fn error(error: String) -> Self {
        Self {
            success: false,
            draft: None,
            cancelled: false,
            error: Some(error),
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/threads/{id}/draft", web::post().to(request_draft));
}

/// Assemble a grounded prompt from thread history, the knowledge catalog
/// and attribution metadata, then ask the selected provider for a draft.
/// The draft is returned to the caller only; nothing is persisted.
async fn request_draft(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<DraftRequestBody>,
) -> impl Responder {
    let thread_id = path.into_inner();

    let provider = match DraftProvider::from_str(&body.provider) {
        Some(p) => p,
        None => {
            return HttpResponse::BadRequest().json(DraftResponse::error(format!(
                "Unknown draft provider: {}",
                body.provider
            )));
        }
    };

    let thread = match state.db.get_thread(&thread_id) {
        Ok(Some(thread)) => thread,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(DraftResponse::error(format!("Thread {} not found", thread_id)));
        }
        Err(e) => {
            log::error!("[DRAFT] thread lookup failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(DraftResponse::error("Failed to load thread".to_string()));
        }
    };

    let items = state.db.list_knowledge_items().unwrap_or_default();
    let history = state.db.list_history(&thread_id).unwrap_or_default();

    let opts = PromptOptions {
        language: state.config.reply_language.clone(),
        max_words: state.config.draft_max_words,
        max_history_turns: body.max_turns.unwrap_or(state.config.draft_history_turns),
    };
    let prompt = build_prompt(&thread, &items, &history, &opts);

    // Provider config is read at call time, never cached across requests.
    // A per-request endpoint wins over the deployment-level override, which
    // wins over the provider client's built-in endpoint.
    let endpoint = body.endpoint.clone().or_else(|| match provider {
        DraftProvider::Instruct => state.config.draft_default_endpoint.clone(),
        DraftProvider::Chat => state.config.draft_chat_endpoint.clone(),
    });
    let provider_config = ProviderConfig {
        provider,
        api_key: body.api_key.clone(),
        endpoint,
        model: body.model.clone(),
        max_tokens: body.max_tokens,
    };
    let client = match DraftClient::from_config(&provider_config) {
        Ok(client) => client,
        Err(e) => {
            // Configuration errors fail before any network call.
            return HttpResponse::BadRequest().json(DraftResponse::error(e.to_string()));
        }
    };

    log::info!(
        "[DRAFT] requesting {} draft for thread {}",
        provider.as_str(),
        thread_id
    );

    match state
        .draft_supervisor
        .generate(&thread_id, &client, &prompt)
        .await
    {
        Ok(Some(draft)) => {
            state
                .broadcaster
                .broadcast(GatewayEvent::draft_ready(&thread_id, &draft));
            HttpResponse::Ok().json(DraftResponse::ok(Some(draft)))
        }
        Ok(None) => HttpResponse::Ok().json(DraftResponse::ok(None)),
        Err(DraftError::Cancelled) => {
            // Discarded by a thread switch or a newer request; the result
            // must never reach a compose buffer.
            HttpResponse::Ok().json(DraftResponse {
                success: false,
                draft: None,
                cancelled: true,
                error: None,
            })
        }
        Err(e) => {
            log::warn!("[DRAFT] generation failed for {}: {}", thread_id, e);
            state
                .broadcaster
                .broadcast(GatewayEvent::draft_failed(&thread_id, &e.to_string()));
            state
                .broadcaster
                .notify("Draft failed", &e.to_string(), Severity::Error);
            HttpResponse::BadGateway().json(DraftResponse::error(e.to_string()))
        }
    }
}
