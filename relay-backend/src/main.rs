use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod channels;
mod config;
mod controllers;
mod db;
mod draft;
mod gateway;
mod models;

use channels::messaging_api::{HttpTransport, MessagingTransport};
use channels::MessageDispatcher;
use config::Config;
use db::Database;
use draft::DraftSupervisor;
use gateway::EventBroadcaster;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub broadcaster: Arc<EventBroadcaster>,
    pub dispatcher: Arc<MessageDispatcher>,
    pub draft_supervisor: Arc<DraftSupervisor>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    let broadcaster = Arc::new(EventBroadcaster::new());

    if config.messaging_endpoint.is_none() {
        log::warn!("Messaging API not configured; sends will fall back to hand-off");
    }
    let transport = MessagingTransport::Http(HttpTransport::from_config(&config));

    let dispatcher = Arc::new(MessageDispatcher::new(
        db.clone(),
        broadcaster.clone(),
        transport,
        &config.handoff_base,
    ));

    let draft_supervisor = Arc::new(DraftSupervisor::new());

    let state = web::Data::new(AppState {
        db,
        config,
        broadcaster,
        dispatcher,
        draft_supervisor,
    });

    log::info!("Starting relay-backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(controllers::health::config)
            .configure(controllers::threads::config)
            .configure(controllers::dispatch::config)
            .configure(controllers::drafts::config)
            .configure(controllers::inbound::config)
            .configure(controllers::knowledge::config)
            .configure(gateway::server::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
