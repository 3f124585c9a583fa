use async_trait::async_trait;
use chrono::Utc;
use regex::RegexBuilder;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntryChanges, EntryStore, NewEntry, StoreError};
use crate::models::{Entry, User};

/// In-process entry store, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so it can be found by email when sharing
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

fn newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, StoreError> {
        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4(),
            created_by: entry.created_by,
            date: entry.date,
            title: entry.title,
            mood: entry.mood,
            content: entry.content,
            collaborators: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_entries_for(&self, user_id: Uuid) -> Result<Vec<Entry>, StoreError> {
        let mut entries: Vec<Entry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.can_access(user_id))
            .cloned()
            .collect();
        newest_first(&mut entries);
        Ok(entries)
    }

    async fn find_entry(&self, entry_id: Uuid) -> Result<Option<Entry>, StoreError> {
        Ok(self.entries.read().await.get(&entry_id).cloned())
    }

    async fn update_entry(&self, entry_id: Uuid, changes: EntryChanges) -> Result<Option<Entry>, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&entry_id).map(|entry| {
            entry.date = changes.date;
            entry.title = changes.title;
            entry.mood = changes.mood;
            entry.content = changes.content;
            entry.updated_at = Utc::now();
            entry.clone()
        }))
    }

    async fn delete_entry(&self, entry_id: Uuid, owner: Uuid) -> Result<Option<Entry>, StoreError> {
        let mut entries = self.entries.write().await;
        if !entries.get(&entry_id).is_some_and(|entry| entry.is_owner(owner)) {
            return Ok(None);
        }
        Ok(entries.remove(&entry_id))
    }

    async fn search_entries(&self, owner: Uuid, pattern: &str) -> Result<Vec<Entry>, StoreError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::InvalidPattern(e.to_string()))?;
        let mut entries: Vec<Entry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.is_owner(owner) && (regex.is_match(&e.title) || regex.is_match(&e.content)))
            .cloned()
            .collect();
        newest_first(&mut entries);
        Ok(entries)
    }

    async fn add_collaborator(&self, entry_id: Uuid, user_id: Uuid) -> Result<Option<Entry>, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&entry_id).map(|entry| {
            if !entry.collaborators.contains(&user_id) {
                entry.collaborators.push(user_id);
                entry.updated_at = Utc::now();
            }
            entry.clone()
        }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
