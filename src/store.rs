//! Durable storage for the session credential.
//!
//! A small SQLite key-value table holding the single opaque access token
//! under a well-known key. Survives process restarts; the token is opaque
//! to this layer and stored as-is.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error::StoreError;

/// Storage key for the access credential.
const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key-value store backed by SQLite.
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Open (or create) the store at the given database URL.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        // Single connection: the store has one logical writer, and in-memory
        // databases exist per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Current credential, if one is stored.
    pub async fn read(&self) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM session_store WHERE key = ?")
                .bind(ACCESS_TOKEN_KEY)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Persist the credential, replacing any previous one.
    pub async fn write(&self, credential: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO session_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
        )
        .bind(ACCESS_TOKEN_KEY)
        .bind(credential)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove the stored credential.
    pub async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM session_store WHERE key = ?")
            .bind(ACCESS_TOKEN_KEY)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
