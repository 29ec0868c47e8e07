//! `GET /ws`: upgrade the request and run the connection's pumps.

use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tracing::{error, info, warn};

use super::connection::{Connection, ConnectionId};
use crate::server::AppState;
use crate::transport::axum_ws;

/// Upgrade handler. A failed upgrade is logged and creates no connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.config.max_message_size)
        .on_failed_upgrade(|e| warn!(error = %e, "websocket upgrade failed"))
        .on_upgrade(move |socket| serve_socket(socket, state))
}

/// Run one upgraded socket until both pumps have exited.
async fn serve_socket(socket: WebSocket, state: AppState) {
    let _open = state.connections.open();
    let id = ConnectionId::new();
    info!(connection_id = %id, "client connected");

    let pumps = Connection::new(id.clone(), axum_ws::transport(socket))
        .with_buffer_depth(state.config.buffer_depth)
        .start(state.config.liveness);

    match pumps.join().await {
        Ok(report) => info!(
            connection_id = %report.id,
            inbound = %report.inbound,
            outbound = %report.outbound,
            lifetime_ms = u64::try_from(report.lifetime.as_millis()).unwrap_or(u64::MAX),
            "client disconnected"
        ),
        Err(e) => error!(connection_id = %id, error = %e, "connection ended abnormally"),
    }
}
