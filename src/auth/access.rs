use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::{EntryStore, StoreError};
use crate::models::Entry;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("entry '{0}' not found")]
    NotFound(String),
    #[error("user {user} may not open entry '{entry}'")]
    Unauthorized { entry: String, user: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fetch an entry and check that `user_id` owns it or collaborates on it.
///
/// Used by the REST reads and, once per join, by the real-time channel.
/// Ids that are not UUIDs cannot name an entry and report `NotFound`.
pub async fn ensure_entry_access(store: &dyn EntryStore, entry_id: &str, user_id: Uuid) -> Result<Entry, AccessError> {
    let Ok(entry_uuid) = Uuid::parse_str(entry_id) else {
        warn!("Access check for malformed entry id '{}'", entry_id);
        return Err(AccessError::NotFound(entry_id.to_string()));
    };

    let entry = match store.find_entry(entry_uuid).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return Err(AccessError::NotFound(entry_id.to_string())),
        Err(e) => {
            error!("Failed to load entry '{}' for access check: {}", entry_id, e);
            return Err(e.into());
        }
    };

    if !entry.can_access(user_id) {
        warn!("User {} denied access to entry '{}'", user_id, entry_id);
        return Err(AccessError::Unauthorized {
            entry: entry_id.to_string(),
            user: user_id,
        });
    }
    Ok(entry)
}
