use tracing::debug;

use crate::models::LeaveRoomMessage;
use crate::ws::{ConnId, Hub};

/// Handle LeaveRoomMessage
pub async fn handle_leave_message(leave_msg: &LeaveRoomMessage, conn_id: ConnId, hub: &Hub) {
    if !hub.leave(conn_id, &leave_msg.room_id).await {
        debug!("Connection {} was not in room {}", conn_id, leave_msg.room_id);
    }
}
