pub mod dbjournal;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Entry, Mood, User};

pub use dbjournal::PgEntryStore;
pub use memory::MemoryEntryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
    #[error("corrupt row for entry {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

/// Fields of a new entry, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub created_by: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub mood: Mood,
    pub content: String,
}

/// Replacement values for an entry's editable fields, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct EntryChanges {
    pub date: NaiveDate,
    pub title: String,
    pub mood: Mood,
    pub content: String,
}

/// Durable entry storage. The collaboration core only ever reads through it
/// (for the access gate); writes come from the REST handlers.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, StoreError>;

    /// Entries owned by or shared with `user_id`, newest date first
    async fn list_entries_for(&self, user_id: Uuid) -> Result<Vec<Entry>, StoreError>;

    async fn find_entry(&self, entry_id: Uuid) -> Result<Option<Entry>, StoreError>;

    async fn update_entry(&self, entry_id: Uuid, changes: EntryChanges) -> Result<Option<Entry>, StoreError>;

    /// Deletes only when `owner` created the entry
    async fn delete_entry(&self, entry_id: Uuid, owner: Uuid) -> Result<Option<Entry>, StoreError>;

    /// Case-insensitive regex match on title or content of `owner`'s entries, newest date first
    async fn search_entries(&self, owner: Uuid, pattern: &str) -> Result<Vec<Entry>, StoreError>;

    /// Adds `user_id` to the collaborator set; no-op when already present
    async fn add_collaborator(&self, entry_id: Uuid, user_id: Uuid) -> Result<Option<Entry>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
