use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomMessage {
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomMessage {
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    pub room_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingMessage {
    pub room_id: String,
    #[serde(default)]
    pub user: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PingMessage {}

/// Frames sent by a client over the real-time channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoomMessage),
    #[serde(rename = "leaveRoom")]
    LeaveRoom(LeaveRoomMessage),
    #[serde(rename = "sendUpdate")]
    SendUpdate(UpdateMessage),
    #[serde(rename = "typing")]
    Typing(TypingMessage),
    #[serde(rename = "ping")]
    Ping(PingMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinedMessage {
    pub room_id: String,
    /// Last content relayed in the room, if any. Not the saved entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveUpdateMessage {
    pub room_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShowTypingMessage {
    pub room_id: String,
    pub user: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

/// Frames sent by the server over the real-time channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "joined")]
    Joined(JoinedMessage),
    #[serde(rename = "receiveUpdate")]
    ReceiveUpdate(ReceiveUpdateMessage),
    #[serde(rename = "showTyping")]
    ShowTyping(ShowTypingMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}

impl ServerMessage {
    /// Room the frame belongs to, if it is room scoped
    pub fn room_id(&self) -> Option<&str> {
        match self {
            ServerMessage::Joined(msg) => Some(&msg.room_id),
            ServerMessage::ReceiveUpdate(msg) => Some(&msg.room_id),
            ServerMessage::ShowTyping(msg) => Some(&msg.room_id),
            ServerMessage::Error(msg) => msg.room_id.as_deref(),
            ServerMessage::Pong(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_frames_by_type_tag() {
        let join: ClientMessage = serde_json::from_str(r#"{"type":"joinRoom","roomId":"entry123"}"#).unwrap();
        assert_eq!(join, ClientMessage::JoinRoom(JoinRoomMessage { room_id: "entry123".to_string() }));

        let update: ClientMessage =
            serde_json::from_str(r#"{"type":"sendUpdate","roomId":"entry123","content":"Hello"}"#).unwrap();
        assert_eq!(
            update,
            ClientMessage::SendUpdate(UpdateMessage { room_id: "entry123".to_string(), content: "Hello".to_string() })
        );

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping(PingMessage {}));
    }

    #[test]
    fn typing_without_user_defaults_to_empty_label() {
        let typing: ClientMessage = serde_json::from_str(r#"{"type":"typing","roomId":"r"}"#).unwrap();
        assert_eq!(typing, ClientMessage::Typing(TypingMessage { room_id: "r".to_string(), user: String::new() }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"load","roomId":"r"}"#).is_err());
    }

    #[test]
    fn joined_omits_missing_snapshot() {
        let joined = ServerMessage::Joined(JoinedMessage { room_id: "r".to_string(), content: None });
        assert_eq!(serde_json::to_string(&joined).unwrap(), r#"{"type":"joined","roomId":"r"}"#);
    }

    #[test]
    fn show_typing_wire_shape() {
        let msg = ServerMessage::ShowTyping(ShowTypingMessage { room_id: "r".to_string(), user: "Alice".to_string() });
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"type":"showTyping","roomId":"r","user":"Alice"}"#);
        assert_eq!(msg.room_id(), Some("r"));
    }
}
