//! Profile Repository - SQLite operations for member profiles using sqlx

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// Member-supplied identity card: in-game nickname plus static ID.
/// Length limits are enforced by the service layer before rows get here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub nickname: String,
    pub static_id: String,
    pub updated_at: DateTime<Utc>,
}

pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, profile: &Profile) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, nickname, static_id, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                nickname = excluded.nickname,
                static_id = excluded.static_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.nickname)
        .bind(&profile.static_id)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %profile.user_id, "Profile stored");
        Ok(())
    }

    pub async fn get(&self, user_id: UserId) -> Result<Option<Profile>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, nickname, static_id, updated_at
            FROM profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Profile {
            user_id: row.get("user_id"),
            nickname: row.get("nickname"),
            static_id: row.get("static_id"),
            updated_at: row.get("updated_at"),
        }))
    }
}
