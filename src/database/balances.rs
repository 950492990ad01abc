//! Balance Repository - SQLite operations for the currency ledger using sqlx
//!
//! Every mutation is a single SQL statement, so concurrent plays and
//! admin adjustments interleave without losing updates. No caller ever
//! reads an amount and writes it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::CoreError;
use crate::UserId;

/// One ledger row. `seq` is the enrollment order and breaks leaderboard
/// ties, so equal balances keep a stable ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRow {
    pub user_id: UserId,
    pub amount: i64,
    pub enrolled_at: DateTime<Utc>,
}

pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Enroll the user at `starting_amount` when absent, then return the
    /// current amount. Reads go through here so leaderboards see every
    /// user who ever checked their balance.
    pub async fn ensure(
        &self,
        user_id: UserId,
        starting_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO balances (user_id, amount, enrolled_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(starting_amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            debug!(user_id = %user_id, amount = starting_amount, "Balance enrolled");
        }

        let row = sqlx::query("SELECT amount FROM balances WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("amount"))
    }

    /// Overwrite the amount, clamping negatives to zero. Enrolls the user
    /// when absent.
    pub async fn set(
        &self,
        user_id: UserId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let amount = amount.max(0);
        sqlx::query(
            r#"
            INSERT INTO balances (user_id, amount, enrolled_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET amount = excluded.amount
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, amount, "Balance set");
        Ok(amount)
    }

    /// Apply a signed delta, clamped at zero. Returns the new amount.
    /// The row must already exist (`ensure` first).
    pub async fn adjust(&self, user_id: UserId, delta: i64) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE balances
            SET amount = MAX(0, amount + ?)
            WHERE user_id = ?
            RETURNING amount
            "#,
        )
        .bind(delta)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let amount: i64 = row.get("amount");
                debug!(user_id = %user_id, delta, amount, "Balance adjusted");
                Ok(amount)
            }
            None => Err(CoreError::not_found(format!("balance for user {user_id}"))),
        }
    }

    /// Debit only when the balance covers it. The condition and the
    /// subtraction are one statement, so two concurrent debits can never
    /// both pass the check against the same funds.
    pub async fn try_debit(&self, user_id: UserId, amount: i64) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE balances
            SET amount = amount - ?
            WHERE user_id = ? AND amount >= ?
            RETURNING amount
            "#,
        )
        .bind(amount)
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let remaining: i64 = row.get("amount");
                debug!(user_id = %user_id, amount, remaining, "Balance debited");
                Ok(remaining)
            }
            None => {
                let available = sqlx::query("SELECT amount FROM balances WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(|row| row.get("amount"))
                    .unwrap_or(0);
                Err(CoreError::InsufficientBalance {
                    needed: amount,
                    available,
                })
            }
        }
    }

    /// Add to the balance. Returns the new amount. The row must already
    /// exist (`ensure` first).
    pub async fn credit(&self, user_id: UserId, amount: i64) -> Result<i64, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE balances
            SET amount = amount + ?
            WHERE user_id = ?
            RETURNING amount
            "#,
        )
        .bind(amount)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let total: i64 = row.get("amount");
                debug!(user_id = %user_id, amount, total, "Balance credited");
                Ok(total)
            }
            None => Err(CoreError::not_found(format!("balance for user {user_id}"))),
        }
    }

    /// Top `k` balances, richest first, enrollment order breaking ties.
    pub async fn top(&self, k: i64) -> Result<Vec<BalanceRow>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, amount, enrolled_at
            FROM balances
            ORDER BY amount DESC, seq ASC
            LIMIT ?
            "#,
        )
        .bind(k)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BalanceRow {
                user_id: row.get("user_id"),
                amount: row.get("amount"),
                enrolled_at: row.get("enrolled_at"),
            })
            .collect())
    }
}
