//! Casino Ban Repository - SQLite operations for the game-ban set

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// Set membership for users barred from casino games. Barred users keep
/// their balance and stay on the leaderboard; only play is refused.
pub struct CasinoBanRepository {
    pool: SqlitePool,
}

impl CasinoBanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ban(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO casino_bans (user_id, banned_at)
            VALUES (?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, "Casino ban recorded");
        Ok(())
    }

    /// Returns `false` when the user was not banned.
    pub async fn lift(&self, user_id: UserId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM casino_bans WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let lifted = result.rows_affected() > 0;
        if lifted {
            debug!(user_id = %user_id, "Casino ban lifted");
        }
        Ok(lifted)
    }

    pub async fn is_banned(&self, user_id: UserId) -> Result<bool, CoreError> {
        let row = sqlx::query("SELECT 1 AS present FROM casino_bans WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}
