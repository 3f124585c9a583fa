use tracing::{info, warn};

use crate::auth::access::{ensure_entry_access, AccessError};
use crate::models::{AuthUser, ErrorMessage, JoinRoomMessage, ServerMessage};
use crate::ws::ConnId;
use crate::AppState;

pub const JOIN_REFUSED: &str = "Entry not found or you don't have access!";
const JOIN_FAILED: &str = "Something went wrong! Please try again later!";

/// Handle JoinRoomMessage: gate on the entry's owner and collaborators, then admit
pub async fn handle_join_message(join_msg: &JoinRoomMessage, conn_id: ConnId, user: &AuthUser, state: &AppState) {
    let room_id = &join_msg.room_id;

    match ensure_entry_access(state.store.as_ref(), room_id, user.id).await {
        Ok(_) => {
            state.hub.join(conn_id, room_id).await;
        }
        Err(e) => {
            let message = match e {
                AccessError::Store(_) => JOIN_FAILED,
                AccessError::NotFound(_) | AccessError::Unauthorized { .. } => JOIN_REFUSED,
            };
            warn!("Join refused for connection {} on room {}: {}", conn_id, room_id, e);
            let refusal = ServerMessage::Error(ErrorMessage {
                room_id: Some(room_id.clone()),
                message: message.to_string(),
            });
            if !state.hub.send_to(conn_id, refusal).await {
                info!("Connection {} gone before join refusal was sent", conn_id);
            }
        }
    }
}
