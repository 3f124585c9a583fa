use chrono::Utc;
use tracing::debug;

use crate::models::{PingMessage, PongMessage, ServerMessage};
use crate::ws::{ConnId, Hub};

/// Handle PingMessage
pub async fn handle_ping_message(_ping_msg: &PingMessage, conn_id: ConnId, hub: &Hub) {
    debug!("Ping received from connection {}", conn_id);

    // Reply with pong
    let pong = ServerMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() });
    hub.send_to(conn_id, pong).await;
}
