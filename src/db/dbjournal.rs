use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use super::{EntryChanges, EntryStore, NewEntry, StoreError};
use crate::models::{Entry, Mood, User};

/// Entry row joined with its collaborator ids
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    created_by: Uuid,
    date: NaiveDate,
    title: String,
    mood: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    collaborators: Vec<Uuid>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let mood = Mood::parse(&row.mood).ok_or_else(|| StoreError::Corrupt {
            id: row.id,
            reason: format!("unknown mood '{}'", row.mood),
        })?;
        Ok(Entry {
            id: row.id,
            created_by: row.created_by,
            date: row.date,
            title: row.title,
            mood,
            content: row.content,
            collaborators: row.collaborators,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
}

const SELECT_ENTRIES: &str = r#"
    SELECT
        e.id, e.created_by, e.date, e.title, e.mood, e.content, e.created_at, e.updated_at,
        COALESCE(ARRAY_AGG(c.user_id) FILTER (WHERE c.user_id IS NOT NULL), '{}') AS collaborators
    FROM entries e
    LEFT JOIN entry_collaborators c ON c.entry_id = e.id
"#;

/// SQLSTATE for `invalid_regular_expression`
const INVALID_REGEX: &str = "2201B";

// Postgres judges `~*` patterns in its own regex dialect
fn search_error(e: SqlxError) -> StoreError {
    if let SqlxError::Database(db) = &e {
        if db.code().as_deref() == Some(INVALID_REGEX) {
            return StoreError::InvalidPattern(db.message().to_string());
        }
    }
    StoreError::Database(e)
}

const GROUP_NEWEST_FIRST: &str = "GROUP BY e.id ORDER BY e.date DESC, e.created_at DESC";

/// Postgres-backed entry store
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    fn rows_to_entries(rows: Vec<EntryRow>) -> Result<Vec<Entry>, StoreError> {
        rows.into_iter().map(Entry::try_from).collect()
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, StoreError> {
        let query_sql = r#"
            INSERT INTO entries (id, created_by, date, title, mood, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id, created_by, date, title, mood, content, created_at, updated_at,
                      ARRAY[]::uuid[] AS collaborators
        "#;

        let row = sqlx::query_as::<_, EntryRow>(query_sql)
            .bind(Uuid::new_v4())
            .bind(entry.created_by)
            .bind(entry.date)
            .bind(&entry.title)
            .bind(entry.mood.as_str())
            .bind(&entry.content)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn list_entries_for(&self, user_id: Uuid) -> Result<Vec<Entry>, StoreError> {
        let query_sql = format!(
            r#"{SELECT_ENTRIES}
            WHERE e.created_by = $1
               OR EXISTS (SELECT 1 FROM entry_collaborators ec WHERE ec.entry_id = e.id AND ec.user_id = $1)
            {GROUP_NEWEST_FIRST}"#
        );

        let rows = sqlx::query_as::<_, EntryRow>(&query_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Self::rows_to_entries(rows)
    }

    async fn find_entry(&self, entry_id: Uuid) -> Result<Option<Entry>, StoreError> {
        let query_sql = format!("{SELECT_ENTRIES} WHERE e.id = $1 GROUP BY e.id");

        let row = sqlx::query_as::<_, EntryRow>(&query_sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Entry::try_from).transpose()
    }

    async fn update_entry(&self, entry_id: Uuid, changes: EntryChanges) -> Result<Option<Entry>, StoreError> {
        let query_sql = r#"
            UPDATE entries
            SET date = $2, title = $3, mood = $4, content = $5, updated_at = NOW()
            WHERE id = $1
        "#;

        let result = sqlx::query(query_sql)
            .bind(entry_id)
            .bind(changes.date)
            .bind(&changes.title)
            .bind(changes.mood.as_str())
            .bind(&changes.content)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_entry(entry_id).await
    }

    async fn delete_entry(&self, entry_id: Uuid, owner: Uuid) -> Result<Option<Entry>, StoreError> {
        let entry = match self.find_entry(entry_id).await? {
            Some(entry) if entry.is_owner(owner) => entry,
            _ => return Ok(None),
        };

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to acquire connection from pool: {}", e);
                return Err(e.into());
            }
        };

        sqlx::query("DELETE FROM entry_collaborators WHERE entry_id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND created_by = $2")
            .bind(entry_id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((result.rows_affected() > 0).then_some(entry))
    }

    async fn search_entries(&self, owner: Uuid, pattern: &str) -> Result<Vec<Entry>, StoreError> {
        let query_sql = format!(
            r#"{SELECT_ENTRIES}
            WHERE e.created_by = $1 AND (e.title ~* $2 OR e.content ~* $2)
            {GROUP_NEWEST_FIRST}"#
        );

        let rows = sqlx::query_as::<_, EntryRow>(&query_sql)
            .bind(owner)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(search_error)?;

        Self::rows_to_entries(rows)
    }

    async fn add_collaborator(&self, entry_id: Uuid, user_id: Uuid) -> Result<Option<Entry>, StoreError> {
        if self.find_entry(entry_id).await?.is_none() {
            return Ok(None);
        }

        let query_sql = r#"
            INSERT INTO entry_collaborators (entry_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (entry_id, user_id) DO NOTHING
        "#;
        let result = sqlx::query(query_sql)
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            sqlx::query("UPDATE entries SET updated_at = NOW() WHERE id = $1")
                .bind(entry_id)
                .execute(&self.pool)
                .await?;
        }

        self.find_entry(entry_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query_sql = r#"
            SELECT id, email, first_name, last_name
            FROM users
            WHERE LOWER(email) = LOWER($1)
        "#;

        let row = sqlx::query_as::<_, UserRow>(query_sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| User {
            id: r.id,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct PgFailure(&'static str);

    impl fmt::Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl std::error::Error for PgFailure {}

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "invalid regular expression: parentheses () not balanced"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn invalid_regex_from_postgres_is_a_pattern_error() {
        let err = search_error(SqlxError::Database(Box::new(PgFailure(INVALID_REGEX))));
        assert!(matches!(err, StoreError::InvalidPattern(msg) if msg.starts_with("invalid regular expression")));
    }

    #[test]
    fn other_database_failures_stay_database_errors() {
        let err = search_error(SqlxError::Database(Box::new(PgFailure("57014"))));
        assert!(matches!(err, StoreError::Database(_)));
        assert!(matches!(search_error(SqlxError::PoolTimedOut), StoreError::Database(_)));
    }
}
