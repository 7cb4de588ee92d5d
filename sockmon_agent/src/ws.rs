//! WebSocket upgrade and per-connection push loop. Sends the cached JSON once per interval.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("client connected");
    let (mut tx, mut rx) = socket.split();
    let mut ticker = interval(state.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cached = state.last_json.read().await.clone();
                // cold start: nothing sampled yet
                if cached.is_empty() {
                    continue;
                }
                if let Err(e) = tx.send(Message::Text(cached)).await {
                    debug!(error = %e, "send failed");
                    break;
                }
            }
            msg = rx.next() => match msg {
                // client messages carry nothing; ignore them
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    info!("client disconnected");
}
