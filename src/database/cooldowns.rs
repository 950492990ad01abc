//! Cooldown Repository - SQLite operations for claim stamps and applications
//!
//! Two kinds of rate-limit state live here: the single last-claim stamp
//! behind work rewards, and the append-only application log behind the
//! recruitment gate. Denied attempts write neither.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// Decision state of a recruitment application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

/// One accepted recruitment submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

pub struct CooldownRepository {
    pool: SqlitePool,
}

impl CooldownRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn last_work_claim(
        &self,
        user_id: UserId,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        let row = sqlx::query("SELECT last_claim_at FROM work_cooldowns WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("last_claim_at")))
    }

    pub async fn record_work_claim(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO work_cooldowns (user_id, last_claim_at)
            VALUES (?, ?)
            ON CONFLICT (user_id) DO UPDATE SET last_claim_at = excluded.last_claim_at
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, "Work claim recorded");
        Ok(())
    }

    /// Append an accepted application in `pending` state.
    pub async fn insert_application(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO applications (user_id, submitted_at, status)
            VALUES (?, ?, 'pending')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.get("id");
        debug!(user_id = %user_id, application_id = id, "Application recorded");
        Ok(id)
    }

    /// How many applications the user submitted at or after `cutoff`.
    pub async fn applications_since(
        &self,
        user_id: UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS submitted
            FROM applications
            WHERE user_id = ? AND submitted_at >= ?
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("submitted"))
    }

    /// Record a decision. Returns `false` when the id is unknown, which
    /// callers report as a no-op rather than an error.
    pub async fn set_application_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            debug!(application_id = id, status = status.as_str(), "Application decided");
        }
        Ok(updated)
    }

    /// Most-recent-first applications for a user.
    pub async fn recent_applications(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Application>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, submitted_at, status
            FROM applications
            WHERE user_id = ?
            ORDER BY submitted_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Application {
                id: row.get("id"),
                user_id: row.get("user_id"),
                submitted_at: row.get("submitted_at"),
                status: ApplicationStatus::parse(row.get::<String, _>("status").as_str()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_text_reads_as_pending() {
        assert_eq!(ApplicationStatus::parse("weird"), ApplicationStatus::Pending);
    }
}
