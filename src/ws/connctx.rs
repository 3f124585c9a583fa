use std::collections::HashSet;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AuthUser, ServerMessage};

pub type ConnId = Uuid;

/// A live connection as seen by the registry
#[derive(Debug)]
pub struct ConnCtx {
    pub id: ConnId,
    pub user: AuthUser,
    pub rooms: HashSet<String>,
    outbound: mpsc::Sender<ServerMessage>,
}

impl ConnCtx {
    pub fn new(user: AuthUser, outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            rooms: HashSet::new(),
            outbound,
        }
    }

    /// Queue a frame without waiting. A full queue or a closed socket drops
    /// the frame for this connection only.
    pub fn deliver(&self, msg: ServerMessage) -> bool {
        match self.outbound.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for connection {}, dropping frame", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Connection {} already closed, dropping frame", self.id);
                false
            }
        }
    }
}
