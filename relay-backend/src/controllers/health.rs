use actix_web::{web, HttpResponse, Responder};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health));
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "service": "relay-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
