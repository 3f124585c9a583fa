use tracing::warn;

use crate::models::{ErrorMessage, ServerMessage, UpdateMessage};
use crate::ws::{ConnId, Hub};

/// Handle UpdateMessage: relay to the rest of the room, nothing is saved
pub async fn handle_update_message(update_msg: UpdateMessage, conn_id: ConnId, hub: &Hub) {
    let UpdateMessage { room_id, content } = update_msg;

    if let Err(e) = hub.broadcast_update(conn_id, &room_id, content).await {
        warn!("Update from {} not relayed: {}", conn_id, e);
        hub.send_to(conn_id, ServerMessage::Error(ErrorMessage {
            room_id: Some(room_id),
            message: e.to_string(),
        }))
        .await;
    }
}
