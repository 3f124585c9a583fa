use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::session::{ClientError, ClientSession, RoomSubscription};
use crate::models::ServerMessage;

/// How long a remote typing label stays visible without a refresh
pub const TYPING_DISPLAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
    ReceivingRemote,
}

/// Something the view should react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A remote update overwrote the buffer
    ContentReplaced(String),
    TypingShown(String),
    TypingCleared,
    /// No local or remote activity for a quiet period
    Settled,
    /// The connection went away
    Closed,
}

/// Client side of one open entry.
///
/// Remote updates replace the buffer unconditionally, even in the middle of a
/// local edit. Nothing is saved from here: persisting the buffer is the REST
/// update's job.
pub struct EditorController {
    subscription: RoomSubscription,
    display_name: String,
    buffer: String,
    state: EditorState,
    typing: Option<(String, Instant)>,
    last_activity: Instant,
    quiet_period: Duration,
    pending: VecDeque<EditorEvent>,
}

impl EditorController {
    /// Join the entry's room through `session` and start from
    /// `initial_content`, or from the room's newer relayed content if any.
    pub async fn open(
        session: &ClientSession,
        entry_id: &str,
        initial_content: String,
        display_name: &str,
    ) -> Result<Self, ClientError> {
        let subscription = session.join(entry_id).await?;
        Ok(Self::with_subscription(subscription, initial_content, display_name))
    }

    pub(crate) fn with_subscription(subscription: RoomSubscription, initial_content: String, display_name: &str) -> Self {
        let buffer = subscription.snapshot().map(str::to_string).unwrap_or(initial_content);
        Self {
            subscription,
            display_name: display_name.to_string(),
            buffer,
            state: EditorState::Idle,
            typing: None,
            last_activity: Instant::now(),
            quiet_period: TYPING_DISPLAY,
            pending: VecDeque::new(),
        }
    }

    pub fn entry_id(&self) -> &str {
        self.subscription.room_id()
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Label of the remote user currently shown as typing
    pub fn typing_label(&self) -> Option<&str> {
        self.typing.as_ref().map(|(label, _)| label.as_str())
    }

    /// Apply a keystroke: replace the buffer and announce it to the room.
    /// Sends are fire-and-forget; a dead connection only gets logged.
    pub fn local_edit(&mut self, content: impl Into<String>) {
        self.buffer = content.into();
        self.state = EditorState::Editing;
        self.last_activity = Instant::now();

        if let Err(e) = self.subscription.send_update(&self.buffer) {
            warn!("Update for {} not sent: {}", self.entry_id(), e);
        }
        if let Err(e) = self.subscription.send_typing(&self.display_name) {
            warn!("Typing notice for {} not sent: {}", self.entry_id(), e);
        }
    }

    /// Apply an inbound frame received at `now`
    pub fn apply(&mut self, msg: ServerMessage, now: Instant) -> Option<EditorEvent> {
        match msg {
            ServerMessage::ReceiveUpdate(update) => {
                if self.state == EditorState::Editing && update.content != self.buffer {
                    debug!("Remote update on {} replaced unsent local edits", self.entry_id());
                }
                self.buffer = update.content.clone();
                self.state = EditorState::ReceivingRemote;
                self.last_activity = now;
                Some(EditorEvent::ContentReplaced(update.content))
            }
            ServerMessage::ShowTyping(typing) => {
                self.typing = Some((typing.user.clone(), now + self.quiet_period));
                Some(EditorEvent::TypingShown(typing.user))
            }
            ServerMessage::Error(e) => {
                warn!("Server rejected a frame for {}: {}", self.entry_id(), e.message);
                None
            }
            ServerMessage::Joined(_) | ServerMessage::Pong(_) => None,
        }
    }

    /// Fire the timers that are due at `now`. Each announcement clears at
    /// most once; a newer announcement pushes its deadline back.
    pub fn tick(&mut self, now: Instant) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        if self.typing.as_ref().is_some_and(|(_, deadline)| *deadline <= now) {
            self.typing = None;
            events.push(EditorEvent::TypingCleared);
        }
        if self.state != EditorState::Idle && self.last_activity + self.quiet_period <= now {
            self.state = EditorState::Idle;
            events.push(EditorEvent::Settled);
        }
        events
    }

    /// Earliest instant at which `tick` has something to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let typing = self.typing.as_ref().map(|(_, deadline)| *deadline);
        let settle = (self.state != EditorState::Idle).then(|| self.last_activity + self.quiet_period);
        match (typing, settle) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Wait for the next inbound frame or timer and return what changed
    pub async fn next_event(&mut self) -> EditorEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            let deadline = self.next_deadline();
            let timer = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                msg = self.subscription.recv() => match msg {
                    Some(msg) => {
                        if let Some(event) = self.apply(msg, Instant::now()) {
                            return event;
                        }
                    }
                    None => return EditorEvent::Closed,
                },
                _ = timer => {
                    let events = self.tick(Instant::now());
                    self.pending.extend(events);
                }
            }
        }
    }
}
