use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, Extension, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::models::{AuthUser, ClientMessage, ErrorMessage, ServerMessage};
use crate::utils::scope_guard::ScopeGuard;
use crate::websocket::msg_join_handler::handle_join_message;
use crate::websocket::msg_leave_handler::handle_leave_message;
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::websocket::msg_typing_handler::handle_typing_message;
use crate::websocket::msg_update_handler::handle_update_message;
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    info!("New WebSocket connection attempt from user {}", user.id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {

    // Register the connection; its frames arrive on `outbound`
    let (conn_id, mut outbound) = state.hub.connect(user.clone()).await;

    // Leave every room however this function exits
    let _registration = {
        let hub = state.hub.clone();
        ScopeGuard::new(move || {
            tokio::spawn(async move {
                hub.disconnect(conn_id).await;
            });
        })
    };

    info!("WebSocket connection established for user {} with connection_id: {}", user.id, conn_id);
    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Drain the connection's queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode frame for connection {}: {}", conn_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Listen to the websocket for incoming frames
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                // Ping/pong frames are answered by the transport
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket error on connection {}: {}", conn_id, e);
                    break;
                }
            };

            // Parse the incoming message as JSON
            let msg: ClientMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Failed to parse frame from connection {}: {}", conn_id, e);
                    state
                        .hub
                        .send_to(conn_id, ServerMessage::Error(ErrorMessage {
                            room_id: None,
                            message: format!("Malformed frame: {}", e),
                        }))
                        .await;
                    continue;
                }
            };

            // Handle different message types
            match msg {
                ClientMessage::JoinRoom(join_msg) => {
                    handle_join_message(&join_msg, conn_id, &user, &state).await;
                }
                ClientMessage::LeaveRoom(leave_msg) => {
                    handle_leave_message(&leave_msg, conn_id, &state.hub).await;
                }
                ClientMessage::SendUpdate(update_msg) => {
                    handle_update_message(update_msg, conn_id, &state.hub).await;
                }
                ClientMessage::Typing(typing_msg) => {
                    handle_typing_message(typing_msg, conn_id, &user, &state.hub).await;
                }
                ClientMessage::Ping(ping_msg) => {
                    handle_ping_message(&ping_msg, conn_id, &state.hub).await;
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    info!("WebSocket connection {} terminated", conn_id);
}
