use std::time::Duration;
use tokio::time::Instant;

use super::connctx::ConnId;

/// The single active typer of a room
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypingIndicator {
    pub label: String,
    pub owner: ConnId,
    pub expires_at: Instant,
}

impl TypingIndicator {
    pub fn new(label: String, owner: ConnId, now: Instant, expiry: Duration) -> Self {
        Self {
            label,
            owner,
            expires_at: now + expiry,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
