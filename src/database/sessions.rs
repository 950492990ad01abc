//! Voice Session Repository - SQLite operations for voice sessions using sqlx

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::{ChannelId, UserId};

/// One interval a user spent in one voice channel. `ended_at` is `None`
/// while the session is still open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSession {
    pub id: i64,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl VoiceSession {
    /// Elapsed time, with open sessions measured against `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).max(chrono::Duration::zero())
    }
}

pub struct VoiceSessionRepository {
    pool: SqlitePool,
}

impl VoiceSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        at: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO voice_sessions (user_id, channel_id, started_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.get("id");
        debug!(user_id = %user_id, channel_id = %channel_id, "Voice session opened");
        Ok(id)
    }

    /// Close every open session for the user. Returns the number of rows
    /// closed; zero is a normal answer, not a failure.
    pub async fn close_open(&self, user_id: UserId, at: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query(
            r#"
            UPDATE voice_sessions
            SET ended_at = ?
            WHERE user_id = ? AND ended_at IS NULL
            "#,
        )
        .bind(at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let closed = result.rows_affected();
        if closed > 0 {
            debug!(user_id = %user_id, closed, "Voice session closed");
        }
        Ok(closed)
    }

    /// Most-recent-first session history, capped at `limit`.
    pub async fn recent(&self, user_id: UserId, limit: i64) -> Result<Vec<VoiceSession>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, channel_id, started_at, ended_at
            FROM voice_sessions
            WHERE user_id = ?
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_session).collect())
    }

    /// The currently open session, when one exists.
    pub async fn open_session(&self, user_id: UserId) -> Result<Option<VoiceSession>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, channel_id, started_at, ended_at
            FROM voice_sessions
            WHERE user_id = ? AND ended_at IS NULL
            ORDER BY started_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_session))
    }
}

fn map_session(row: sqlx::sqlite::SqliteRow) -> VoiceSession {
    VoiceSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        channel_id: row.get("channel_id"),
        started_at: row.get("started_at"),
        ended_at: row.get("ended_at"),
    }
}
