use futures_util::{SinkExt, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::models::{
    ClientMessage, JoinRoomMessage, LeaveRoomMessage, PingMessage, ServerMessage, TypingMessage, UpdateMessage,
};
use crate::utils::scope_guard::{boxed_guard, BoxedGuard};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid token: {0}")]
    Token(#[from] InvalidHeaderValue),
    #[error("connection closed")]
    Closed,
    #[error("join refused for room '{room_id}': {message}")]
    JoinRefused { room_id: String, message: String },
    #[error("already subscribed to room '{0}'")]
    AlreadySubscribed(String),
}

/// Where inbound frames go: room frames to their subscriber, pongs to the
/// oldest outstanding ping
#[derive(Default)]
struct Routes {
    rooms: HashMap<String, mpsc::UnboundedSender<ServerMessage>>,
    pings: VecDeque<oneshot::Sender<String>>,
    closed: bool,
}

type SharedRoutes = Arc<Mutex<Routes>>;

fn route(routes: &SharedRoutes, msg: ServerMessage) {
    let Ok(mut routes) = routes.lock() else {
        return;
    };
    match msg {
        ServerMessage::Pong(pong) => match routes.pings.pop_front() {
            Some(waiter) => {
                let _ = waiter.send(pong.date);
            }
            None => debug!("Unsolicited pong"),
        },
        msg => {
            let Some(room_id) = msg.room_id().map(str::to_string) else {
                if let ServerMessage::Error(e) = &msg {
                    warn!("Server error: {}", e.message);
                }
                return;
            };
            match routes.rooms.get(&room_id) {
                Some(listener) => {
                    let _ = listener.send(msg);
                }
                None => debug!("No subscriber for room {}", room_id),
            }
        }
    }
}

/// Handle on one real-time connection.
///
/// Cheap to clone; every clone writes to the same socket. Inbound frames are
/// routed by room id to the matching [`RoomSubscription`]. The socket closes
/// on [`close`](Self::close) or once every clone and subscription is dropped.
#[derive(Clone)]
pub struct ClientSession {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    routes: SharedRoutes,
    shutdown: Arc<Notify>,
}

impl ClientSession {
    /// Open the real-time channel at `url` (e.g. `ws://host:3000/ws`)
    pub async fn connect(url: &str, token: &str) -> Result<Self, ClientError> {
        let mut request = url.into_client_request()?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);

        let (stream, _) = connect_async(request).await?;
        info!("Connected to {}", url);
        let (mut sink, mut source) = stream.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let session = Self::new(outbound);

        // Runs until close() or until the last handle drops its sender
        let shutdown = session.shutdown.clone();
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    msg = outbound_rx.recv() => match msg {
                        Some(msg) => msg,
                        None => break,
                    },
                    _ = shutdown.notified() => break,
                };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode frame: {}", e);
                        continue;
                    }
                };
                if sink.send(WsMessage::text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // The reader only needs the routing table, never a sender
        let routes = session.routes.clone();
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(msg) => route(&routes, msg),
                        Err(e) => warn!("Ignoring malformed server frame: {}", e),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                }
            }
            // Dropping the senders ends every open subscription and ping
            if let Ok(mut routes) = routes.lock() {
                routes.rooms.clear();
                routes.pings.clear();
                routes.closed = true;
            }
            info!("Disconnected");
        });

        Ok(session)
    }

    pub(crate) fn new(outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self {
            outbound,
            routes: SharedRoutes::default(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Route an inbound frame as the reader task would
    pub(crate) fn dispatch(&self, msg: ServerMessage) {
        route(&self.routes, msg);
    }

    /// Fire-and-forget send
    pub fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        self.outbound.send(msg).map_err(|_| ClientError::Closed)
    }

    /// Round trip to the server; returns the server's clock from the `pong`
    pub async fn ping(&self) -> Result<String, ClientError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut routes = self.routes.lock().map_err(|_| ClientError::Closed)?;
            if routes.closed {
                return Err(ClientError::Closed);
            }
            routes.pings.push_back(tx);
        }
        self.send(ClientMessage::Ping(PingMessage::default()))?;
        rx.await.map_err(|_| ClientError::Closed)
    }

    /// Close the socket for every clone of this session. Frames still
    /// queued are discarded.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Join a room and wait for the server's verdict.
    ///
    /// The returned subscription leaves the room when dropped.
    pub async fn join(&self, room_id: &str) -> Result<RoomSubscription, ClientError> {
        let (tx, mut inbound) = mpsc::unbounded_channel();
        {
            let mut routes = self.routes.lock().map_err(|_| ClientError::Closed)?;
            if routes.closed {
                return Err(ClientError::Closed);
            }
            if routes.rooms.contains_key(room_id) {
                return Err(ClientError::AlreadySubscribed(room_id.to_string()));
            }
            routes.rooms.insert(room_id.to_string(), tx);
        }

        let guard = {
            let session = self.clone();
            let room_id = room_id.to_string();
            boxed_guard(move || {
                if let Ok(mut routes) = session.routes.lock() {
                    routes.rooms.remove(&room_id);
                }
                let _ = session.send(ClientMessage::LeaveRoom(LeaveRoomMessage { room_id }));
            })
        };

        self.send(ClientMessage::JoinRoom(JoinRoomMessage {
            room_id: room_id.to_string(),
        }))?;

        loop {
            match inbound.recv().await {
                Some(ServerMessage::Joined(joined)) => {
                    return Ok(RoomSubscription {
                        room_id: room_id.to_string(),
                        snapshot: joined.content,
                        inbound,
                        session: self.clone(),
                        _guard: guard,
                    });
                }
                Some(ServerMessage::Error(refused)) => {
                    return Err(ClientError::JoinRefused {
                        room_id: room_id.to_string(),
                        message: refused.message,
                    });
                }
                Some(other) => debug!("Frame before join acknowledgement: {:?}", other),
                None => return Err(ClientError::Closed),
            }
        }
    }
}

/// Membership in one room, held for as long as the value lives
pub struct RoomSubscription {
    room_id: String,
    snapshot: Option<String>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    session: ClientSession,
    _guard: BoxedGuard,
}

impl RoomSubscription {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Content last relayed in the room before we joined
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Next frame for this room; `None` once the connection is gone
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.inbound.recv().await
    }

    pub fn send_update(&self, content: &str) -> Result<(), ClientError> {
        self.session.send(ClientMessage::SendUpdate(UpdateMessage {
            room_id: self.room_id.clone(),
            content: content.to_string(),
        }))
    }

    pub fn send_typing(&self, user: &str) -> Result<(), ClientError> {
        self.session.send(ClientMessage::Typing(TypingMessage {
            room_id: self.room_id.clone(),
            user: user.to_string(),
        }))
    }
}
