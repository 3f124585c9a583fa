use std::collections::HashSet;
use tokio::time::Instant;

use super::connctx::ConnId;
use super::typing::TypingIndicator;

/// Broadcast group keyed by entry id
#[derive(Debug, Default)]
pub struct Room {
    pub members: HashSet<ConnId>,
    /// Last relayed content. Never written back to the entry store.
    pub snapshot: Option<String>,
    pub typing: Option<TypingIndicator>,
}

impl Room {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current typer label, if the indicator has not expired
    pub fn active_typer(&self, now: Instant) -> Option<&str> {
        self.typing
            .as_ref()
            .filter(|t| t.is_active(now))
            .map(|t| t.label.as_str())
    }

    /// Remove a member and any indicator it owns. No-op for non-members.
    pub fn remove_member(&mut self, conn_id: &ConnId) -> bool {
        if self.typing.as_ref().is_some_and(|t| &t.owner == conn_id) {
            self.typing = None;
        }
        self.members.remove(conn_id)
    }
}
