use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use super::connctx::{ConnCtx, ConnId};
use super::room::Room;
use super::typing::TypingIndicator;
use crate::models::{AuthUser, JoinedMessage, ReceiveUpdateMessage, ServerMessage, ShowTypingMessage};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("connection is not a member of room '{0}'")]
    NotMember(String),
}

/// Aggregated view of the hub, used by diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub rooms: usize,
    pub members: usize,
    pub typing: usize,
}

#[derive(Default)]
struct HubState {
    conns: HashMap<ConnId, ConnCtx>,
    rooms: HashMap<String, Room>,
}

impl HubState {
    /// Deliver to every member of `room_id` except `sender`
    fn fan_out(&self, sender: ConnId, room_id: &str, msg: &ServerMessage) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            return 0;
        };
        room.members
            .iter()
            .filter(|id| **id != sender)
            .filter_map(|id| self.conns.get(id))
            .filter(|conn| conn.deliver(msg.clone()))
            .count()
    }

    fn ensure_member(&self, conn_id: ConnId, room_id: &str) -> Result<(), HubError> {
        match self.rooms.get(room_id) {
            Some(room) if room.members.contains(&conn_id) => Ok(()),
            _ => Err(HubError::NotMember(room_id.to_string())),
        }
    }

    /// Drop membership; empty rooms are discarded
    fn remove_membership(&mut self, conn_id: ConnId, room_id: &str) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = room.remove_member(&conn_id);
        if room.is_empty() {
            self.rooms.remove(room_id);
            debug!("Room {} is empty, discarded", room_id);
        }
        removed
    }
}

/// Session registry, room broadcaster and typing coordinator.
///
/// All state sits behind one lock so membership changes and relays are
/// serialized. Relays never await a receiver: frames are queued with
/// `try_send` and dropped for connections whose queue is full or closed.
pub struct Hub {
    state: RwLock<HubState>,
    typing_expiry: Duration,
    send_queue: usize,
}

impl Hub {
    pub fn new(typing_expiry: Duration, send_queue: usize) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            typing_expiry,
            send_queue: send_queue.max(1),
        }
    }

    /// Register a connection. The receiver yields the frames to write to its socket.
    pub async fn connect(&self, user: AuthUser) -> (ConnId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.send_queue);
        let conn = ConnCtx::new(user, tx);
        let conn_id = conn.id;
        info!("Connection {} registered for user {}", conn_id, conn.user.id);
        self.state.write().await.conns.insert(conn_id, conn);
        (conn_id, rx)
    }

    /// Forget a connection and remove it from every room it joined.
    /// Returns how many rooms it was removed from.
    pub async fn disconnect(&self, conn_id: ConnId) -> usize {
        let mut state = self.state.write().await;
        let Some(conn) = state.conns.remove(&conn_id) else {
            return 0;
        };
        let left = conn
            .rooms
            .iter()
            .filter(|room_id| state.remove_membership(conn_id, room_id))
            .count();
        info!("Connection {} unregistered, left {} room(s)", conn_id, left);
        left
    }

    /// Add a connection to a room, creating the room on first join.
    ///
    /// The `joined` acknowledgement is queued before the lock is released, so
    /// it always precedes any relay the connection receives for that room.
    /// Returns false when the connection is unknown.
    pub async fn join(&self, conn_id: ConnId, room_id: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(conn) = state.conns.get_mut(&conn_id) else {
            return false;
        };
        let newly_joined = conn.rooms.insert(room_id.to_string());

        let room = state.rooms.entry(room_id.to_string()).or_default();
        room.members.insert(conn_id);
        let ack = ServerMessage::Joined(JoinedMessage {
            room_id: room_id.to_string(),
            content: room.snapshot.clone(),
        });

        if let Some(conn) = state.conns.get(&conn_id) {
            conn.deliver(ack);
        }
        if newly_joined {
            info!("Connection {} joined room {}", conn_id, room_id);
        }
        true
    }

    /// Leave a room. Leaving a room that was never joined is a no-op.
    pub async fn leave(&self, conn_id: ConnId, room_id: &str) -> bool {
        let mut state = self.state.write().await;
        if let Some(conn) = state.conns.get_mut(&conn_id) {
            conn.rooms.remove(room_id);
        }
        let removed = state.remove_membership(conn_id, room_id);
        if removed {
            info!("Connection {} left room {}", conn_id, room_id);
        }
        removed
    }

    /// Relay content to the other members of a room and keep it as the room
    /// snapshot. Returns the number of members the frame was queued for.
    pub async fn broadcast_update(&self, sender: ConnId, room_id: &str, content: String) -> Result<usize, HubError> {
        let mut state = self.state.write().await;
        state.ensure_member(sender, room_id)?;

        let msg = ServerMessage::ReceiveUpdate(ReceiveUpdateMessage {
            room_id: room_id.to_string(),
            content: content.clone(),
        });
        let delivered = state.fan_out(sender, room_id, &msg);
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.snapshot = Some(content);
        }
        debug!("Update from {} relayed to {} member(s) of {}", sender, delivered, room_id);
        Ok(delivered)
    }

    /// Record `label` as the room's typer and relay `showTyping` to the
    /// other members.
    pub async fn notify_typing(&self, sender: ConnId, room_id: &str, label: String) -> Result<usize, HubError> {
        let mut state = self.state.write().await;
        state.ensure_member(sender, room_id)?;

        let msg = ServerMessage::ShowTyping(ShowTypingMessage {
            room_id: room_id.to_string(),
            user: label.clone(),
        });
        let delivered = state.fan_out(sender, room_id, &msg);
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.typing = Some(TypingIndicator::new(label, sender, Instant::now(), self.typing_expiry));
        }
        Ok(delivered)
    }

    /// Queue a frame for a single connection
    pub async fn send_to(&self, conn_id: ConnId, msg: ServerMessage) -> bool {
        let state = self.state.read().await;
        state.conns.get(&conn_id).is_some_and(|conn| conn.deliver(msg))
    }

    /// Label of the room's current typer, unless it has expired
    pub async fn current_typer(&self, room_id: &str) -> Option<String> {
        let state = self.state.read().await;
        state
            .rooms
            .get(room_id)
            .and_then(|room| room.active_typer(Instant::now()))
            .map(str::to_string)
    }

    pub async fn members(&self, room_id: &str) -> Vec<ConnId> {
        let state = self.state.read().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn rooms_of(&self, conn_id: ConnId) -> Vec<String> {
        let state = self.state.read().await;
        state
            .conns
            .get(&conn_id)
            .map(|conn| conn.rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn stats(&self) -> HubStats {
        let state = self.state.read().await;
        let now = Instant::now();
        HubStats {
            connections: state.conns.len(),
            rooms: state.rooms.len(),
            members: state.rooms.values().map(|r| r.members.len()).sum(),
            typing: state.rooms.values().filter(|r| r.active_typer(now).is_some()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(name: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            name: Some(name.to_string()),
            roles: Vec::new(),
        }
    }

    fn hub() -> Hub {
        Hub::new(Duration::from_millis(3000), 16)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut frames = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            frames.push(msg);
        }
        frames
    }

    fn updates(frames: &[ServerMessage]) -> Vec<&str> {
        frames
            .iter()
            .filter_map(|f| match f {
                ServerMessage::ReceiveUpdate(u) => Some(u.content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let hub = hub();
        let (a, _rx) = hub.connect(user("Alice")).await;

        assert!(hub.join(a, "entry123").await);
        assert!(hub.join(a, "entry123").await);
        assert!(hub.join(a, "entry123").await);

        assert_eq!(hub.members("entry123").await, vec![a]);
        assert_eq!(hub.rooms_of(a).await, vec!["entry123".to_string()]);
    }

    #[tokio::test]
    async fn join_acknowledges_with_room_snapshot() {
        let hub = hub();
        let (a, mut rx_a) = hub.connect(user("Alice")).await;
        let (b, mut rx_b) = hub.connect(user("Bob")).await;

        hub.join(a, "entry123").await;
        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::Joined(JoinedMessage { room_id: "entry123".to_string(), content: None })]
        );

        hub.broadcast_update(a, "entry123", "draft".to_string()).await.unwrap();
        hub.join(b, "entry123").await;
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::Joined(JoinedMessage {
                room_id: "entry123".to_string(),
                content: Some("draft".to_string())
            })]
        );
    }

    #[tokio::test]
    async fn broadcast_skips_sender_and_non_members() {
        let hub = hub();
        let (a, mut rx_a) = hub.connect(user("Alice")).await;
        let (b, mut rx_b) = hub.connect(user("Bob")).await;
        let (c, mut rx_c) = hub.connect(user("Carol")).await;
        hub.join(a, "entry123").await;
        hub.join(b, "entry123").await;
        hub.join(c, "other").await;
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        let delivered = hub.broadcast_update(a, "entry123", "Hello".to_string()).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(updates(&drain(&mut rx_b)), vec!["Hello"]);
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn non_member_cannot_relay() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, mut rx_b) = hub.connect(user("Bob")).await;
        hub.join(b, "entry123").await;
        drain(&mut rx_b);

        assert_eq!(
            hub.broadcast_update(a, "entry123", "sneaky".to_string()).await,
            Err(HubError::NotMember("entry123".to_string()))
        );
        assert_eq!(
            hub.notify_typing(a, "entry123", "Alice".to_string()).await,
            Err(HubError::NotMember("entry123".to_string()))
        );
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn last_write_wins_in_relay_order() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, _rx_b) = hub.connect(user("Bob")).await;
        let (c, mut rx_c) = hub.connect(user("Carol")).await;
        for conn in [a, b, c] {
            hub.join(conn, "entry123").await;
        }
        drain(&mut rx_c);

        hub.broadcast_update(a, "entry123", "U1".to_string()).await.unwrap();
        hub.broadcast_update(b, "entry123", "U2".to_string()).await.unwrap();

        assert_eq!(updates(&drain(&mut rx_c)).last(), Some(&"U2"));
        let (d, mut rx_d) = hub.connect(user("Dave")).await;
        hub.join(d, "entry123").await;
        assert_eq!(
            drain(&mut rx_d),
            vec![ServerMessage::Joined(JoinedMessage {
                room_id: "entry123".to_string(),
                content: Some("U2".to_string())
            })]
        );
    }

    #[tokio::test]
    async fn disconnect_removes_every_membership() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, _rx_b) = hub.connect(user("Bob")).await;
        hub.join(a, "one").await;
        hub.join(a, "two").await;
        hub.join(b, "two").await;

        assert_eq!(hub.disconnect(a).await, 2);

        assert!(hub.members("one").await.is_empty());
        assert_eq!(hub.members("two").await, vec![b]);
        assert!(hub.rooms_of(a).await.is_empty());
        assert!(!hub.join(a, "one").await, "a gone connection must not re-enter a room");
        assert_eq!(hub.disconnect(a).await, 0);
        assert_eq!(hub.stats().await, HubStats { connections: 1, rooms: 1, members: 1, typing: 0 });
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let hub = hub();
        let (a, _rx) = hub.connect(user("Alice")).await;
        hub.join(a, "entry123").await;

        assert!(hub.leave(a, "entry123").await);
        assert!(!hub.leave(a, "entry123").await);
        assert!(!hub.leave(a, "never-joined").await);
        assert!(hub.rooms_of(a).await.is_empty());
    }

    #[tokio::test]
    async fn closed_receiver_is_dropped_silently() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, rx_b) = hub.connect(user("Bob")).await;
        let (c, mut rx_c) = hub.connect(user("Carol")).await;
        for conn in [a, b, c] {
            hub.join(conn, "entry123").await;
        }
        drain(&mut rx_c);
        drop(rx_b);

        let delivered = hub.broadcast_update(a, "entry123", "still here".to_string()).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(updates(&drain(&mut rx_c)), vec!["still here"]);
    }

    #[tokio::test]
    async fn full_queue_does_not_stall_other_members() {
        let hub = Hub::new(Duration::from_millis(3000), 1);
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (slow, _rx_slow) = hub.connect(user("Slow")).await;
        let (fast, mut rx_fast) = hub.connect(user("Fast")).await;
        for conn in [a, slow, fast] {
            hub.join(conn, "entry123").await;
        }
        // The slow member never reads: its single slot still holds the join ack.
        for n in 0..3 {
            drain(&mut rx_fast);
            let delivered = hub.broadcast_update(a, "entry123", format!("v{n}")).await.unwrap();
            assert_eq!(delivered, 1);
            assert_eq!(updates(&drain(&mut rx_fast)), vec![format!("v{n}").as_str()]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typing_indicator_expires_and_is_superseded() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, mut rx_b) = hub.connect(user("Bob")).await;
        hub.join(a, "entry123").await;
        hub.join(b, "entry123").await;
        drain(&mut rx_b);

        hub.notify_typing(a, "entry123", "Alice".to_string()).await.unwrap();
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::ShowTyping(ShowTypingMessage {
                room_id: "entry123".to_string(),
                user: "Alice".to_string()
            })]
        );
        assert_eq!(hub.current_typer("entry123").await.as_deref(), Some("Alice"));

        tokio::time::advance(Duration::from_millis(2000)).await;
        hub.notify_typing(b, "entry123", "Bob".to_string()).await.unwrap();
        assert_eq!(hub.current_typer("entry123").await.as_deref(), Some("Bob"));

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert_eq!(hub.current_typer("entry123").await.as_deref(), Some("Bob"));
        assert_eq!(hub.stats().await.typing, 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(hub.current_typer("entry123").await, None);
        assert_eq!(hub.stats().await.typing, 0);
    }

    #[tokio::test]
    async fn disconnect_discards_owned_typing_indicator() {
        let hub = hub();
        let (a, _rx_a) = hub.connect(user("Alice")).await;
        let (b, _rx_b) = hub.connect(user("Bob")).await;
        hub.join(a, "entry123").await;
        hub.join(b, "entry123").await;

        hub.notify_typing(a, "entry123", "Alice".to_string()).await.unwrap();
        hub.disconnect(a).await;

        assert_eq!(hub.current_typer("entry123").await, None);
    }
}
