use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Mood attached to a journal entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
pub enum Mood {
    #[serde(rename = "🙂")]
    Happy,
    #[serde(rename = "😔")]
    Sad,
    #[serde(rename = "😡")]
    Angry,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "🙂",
            Mood::Sad => "😔",
            Mood::Angry => "😡",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "🙂" => Some(Mood::Happy),
            "😔" => Some(Mood::Sad),
            "😡" => Some(Mood::Angry),
            _ => None,
        }
    }
}

/// A dated journal entry, owned by one user and optionally shared
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub created_by: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub mood: Mood,
    pub content: String,
    pub collaborators: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    /// Owner or collaborator
    pub fn can_access(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.collaborators.contains(&user_id)
    }
}

/// Registered user, as far as sharing needs to know about it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request payload for creating or updating an entry.
/// Fields are optional so missing ones can be reported with a 422.
#[derive(Serialize, Deserialize, Debug, Clone, Default, ToSchema)]
pub struct EntryRequest {
    pub date: Option<String>,
    pub title: Option<String>,
    pub mood: Option<String>,
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct EntryResponse {
    pub message: String,
    pub data: Entry,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct EntriesResponse {
    pub message: String,
    pub data: Vec<Entry>,
}

/// Request payload for sharing an entry with another user
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ShareEntryRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub text: Option<String>,
}
