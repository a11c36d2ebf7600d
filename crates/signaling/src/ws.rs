//! WebSocket-Endpunkt `GET /ws`
//!
//! Bildet Socket-Ereignisse auf den Dispatcher ab. Jede Upgrade-Anfrage
//! wird zu einer eigenen `ClientConnection`.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

/// Router mit dem Signaling-Endpunkt
pub fn signaling_router(state: Arc<SignalingState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<SignalingState>>) -> Response {
    ws.on_failed_upgrade(|e| tracing::warn!(fehler = %e, "WebSocket-Upgrade fehlgeschlagen"))
        .on_upgrade(move |socket| ClientConnection::neu(state).verarbeiten(socket))
}
