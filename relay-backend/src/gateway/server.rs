use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/gateway", web::get().to(gateway_ws));
}

/// WebSocket endpoint streaming gateway events (dispatch outcomes, drafts,
/// inbound messages, notifications) to UI clients.
async fn gateway_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let broadcaster = state.broadcaster.clone();
    let (client_id, mut event_rx) = broadcaster.subscribe();
    log::info!("Gateway client {} connected", client_id);

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                // Forward broadcast events to the client
                event = event_rx.recv() => {
                    match event {
                        Some(event) => {
                            let json = match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(_) => continue,
                            };
                            if session.text(json).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                // Keep the protocol alive; clients only listen
                msg = msg_stream.next() => {
                    match msg {
                        Some(Ok(actix_ws::Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(actix_ws::Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            log::debug!("Gateway client {} error: {}", client_id, e);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }

        broadcaster.unsubscribe(&client_id);
        let _ = session.close(None).await;
        log::info!("Gateway client {} disconnected", client_id);
    });

    Ok(response)
}
