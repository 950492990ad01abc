//! Strike Repository - SQLite operations for the violation counter using sqlx

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// Per-user monotonic violation counter. Only `reset` moves it down, and
/// only an operator calls that.
pub struct StrikeRepository {
    pool: SqlitePool,
}

impl StrikeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add one strike and return the post-increment count. Insert and
    /// increment are one statement, so concurrent violations by the same
    /// user serialize in the store and each caller sees a distinct count.
    pub async fn increment(&self, user_id: UserId, at: DateTime<Utc>) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO security_strikes (user_id, strike_count, last_violation_at)
            VALUES (?, 1, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                strike_count = strike_count + 1,
                last_violation_at = excluded.last_violation_at
            RETURNING strike_count
            "#,
        )
        .bind(user_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.get("strike_count");
        debug!(user_id = %user_id, count, "Strike recorded");
        Ok(count)
    }

    pub async fn count(&self, user_id: UserId) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT strike_count FROM security_strikes WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("strike_count")).unwrap_or(0))
    }

    /// Clear the counter. Returns `false` when the user had none.
    pub async fn reset(&self, user_id: UserId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM security_strikes WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let cleared = result.rows_affected() > 0;
        if cleared {
            debug!(user_id = %user_id, "Strikes cleared");
        }
        Ok(cleared)
    }
}
