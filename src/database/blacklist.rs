//! Blacklist Repository - SQLite operations for the exclusion roster using sqlx

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// One excluded user. Membership is single per user; re-adding replaces
/// the reason and attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub user_id: UserId,
    pub reason: String,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

pub struct BlacklistRepository {
    pool: SqlitePool,
}

impl BlacklistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the entry. Latest reason wins.
    pub async fn upsert(&self, entry: &BlacklistEntry) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO blacklist (user_id, reason, added_by, added_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                reason = excluded.reason,
                added_by = excluded.added_by,
                added_at = excluded.added_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.reason)
        .bind(entry.added_by)
        .bind(entry.added_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %entry.user_id, added_by = %entry.added_by, "Blacklist entry stored");
        Ok(())
    }

    /// Returns `false` when the user was not listed.
    pub async fn remove(&self, user_id: UserId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM blacklist WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            debug!(user_id = %user_id, "Blacklist entry removed");
        }
        Ok(removed)
    }

    pub async fn get(&self, user_id: UserId) -> Result<Option<BlacklistEntry>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, reason, added_by, added_at
            FROM blacklist
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_entry))
    }

    /// Full roster, newest listing first.
    pub async fn all(&self) -> Result<Vec<BlacklistEntry>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, reason, added_by, added_at
            FROM blacklist
            ORDER BY added_at DESC, user_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_entry).collect())
    }
}

fn map_entry(row: sqlx::sqlite::SqliteRow) -> BlacklistEntry {
    BlacklistEntry {
        user_id: row.get("user_id"),
        reason: row.get("reason"),
        added_by: row.get("added_by"),
        added_at: row.get("added_at"),
    }
}
