use tracing::warn;

use crate::models::{AuthUser, ErrorMessage, ServerMessage, TypingMessage};
use crate::ws::{ConnId, Hub};

/// Handle TypingMessage. A blank label falls back to the token's display name.
pub async fn handle_typing_message(typing_msg: TypingMessage, conn_id: ConnId, user: &AuthUser, hub: &Hub) {
    let TypingMessage { room_id, user: label } = typing_msg;
    let label = if label.trim().is_empty() {
        user.display_name().to_string()
    } else {
        label
    };

    if let Err(e) = hub.notify_typing(conn_id, &room_id, label).await {
        warn!("Typing notice from {} not relayed: {}", conn_id, e);
        hub.send_to(conn_id, ServerMessage::Error(ErrorMessage {
            room_id: Some(room_id),
            message: e.to_string(),
        }))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn user(name: Option<&str>) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            roles: Vec::new(),
        }
    }

    fn shown_labels(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<String> {
        let mut labels = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::ShowTyping(typing) = msg {
                labels.push(typing.user);
            }
        }
        labels
    }

    async fn room_of_two(typer: &AuthUser) -> (Hub, ConnId, mpsc::Receiver<ServerMessage>) {
        let hub = Hub::new(Duration::from_millis(3000), 16);
        let (a, _rx_a) = hub.connect(typer.clone()).await;
        let (b, rx_b) = hub.connect(user(Some("Bob"))).await;
        hub.join(a, "entry123").await;
        hub.join(b, "entry123").await;
        (hub, a, rx_b)
    }

    fn typing(label: &str) -> TypingMessage {
        TypingMessage {
            room_id: "entry123".to_string(),
            user: label.to_string(),
        }
    }

    #[tokio::test]
    async fn announced_label_is_relayed_as_sent() {
        let alice = user(Some("Alice"));
        let (hub, a, mut rx_b) = room_of_two(&alice).await;

        handle_typing_message(typing("Ali (mobile)"), a, &alice, &hub).await;

        assert_eq!(shown_labels(&mut rx_b), vec!["Ali (mobile)".to_string()]);
    }

    #[tokio::test]
    async fn blank_label_falls_back_to_token_name() {
        let alice = user(Some("Alice"));
        let (hub, a, mut rx_b) = room_of_two(&alice).await;

        handle_typing_message(typing("  "), a, &alice, &hub).await;

        assert_eq!(shown_labels(&mut rx_b), vec!["Alice".to_string()]);
        assert_eq!(hub.current_typer("entry123").await.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn blank_label_without_token_name_shows_someone() {
        let anonymous = user(None);
        let (hub, a, mut rx_b) = room_of_two(&anonymous).await;

        handle_typing_message(typing(""), a, &anonymous, &hub).await;

        assert_eq!(shown_labels(&mut rx_b), vec!["Someone".to_string()]);
    }

    #[tokio::test]
    async fn typing_outside_the_room_is_answered_with_error() {
        let hub = Hub::new(Duration::from_millis(3000), 16);
        let carol = user(Some("Carol"));
        let (c, mut rx_c) = hub.connect(carol.clone()).await;

        handle_typing_message(typing("Carol"), c, &carol, &hub).await;

        match rx_c.try_recv() {
            Ok(ServerMessage::Error(e)) => assert_eq!(e.room_id.as_deref(), Some("entry123")),
            other => panic!("expected an error frame, got {:?}", other),
        }
        assert_eq!(hub.current_typer("entry123").await, None);
    }
}
