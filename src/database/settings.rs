//! Settings Repository - SQLite key/value store for runtime configuration
//!
//! Role and channel IDs that admins rewire at runtime live here instead
//! of in code, so repointing them does not need a redeploy.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;

pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, "Setting stored");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Like `get`, but a missing key is an error. Use for settings the
    /// caller cannot proceed without.
    pub async fn require(&self, key: &str) -> Result<String, CoreError> {
        self.get(key)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("setting '{key}'")))
    }

    /// Every stored pair, sorted by key for stable rendering.
    pub async fn all(&self) -> Result<Vec<(String, String)>, CoreError> {
        let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }
}
