//! Economy Ledger - balance reads, admin mutations and the leaderboard

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::database::balances::BalanceRow;
use crate::database::pool::DatabasePool;
use crate::error::CoreError;
use crate::UserId;

/// Front door to the currency ledger. Reads auto-enroll, so any user who
/// ever checked a balance exists for leaderboard purposes.
pub struct EconomyLedger {
    db: Arc<DatabasePool>,
    starting_balance: i64,
}

impl EconomyLedger {
    pub fn new(db: Arc<DatabasePool>, starting_balance: i64) -> Self {
        Self {
            db,
            starting_balance,
        }
    }

    /// Current balance, enrolling the user at the starting amount on
    /// first contact.
    pub async fn balance(&self, user_id: UserId, now: DateTime<Utc>) -> Result<i64, CoreError> {
        self.db
            .balances()
            .ensure(user_id, self.starting_balance, now)
            .await
    }

    /// Admin overwrite. Negative requests land at zero.
    pub async fn set_balance(
        &self,
        user_id: UserId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        let stored = self.db.balances().set(user_id, amount, now).await?;
        info!(user_id = %user_id, amount = stored, "Balance overwritten");
        Ok(stored)
    }

    /// Add funds. The amount must be positive.
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        if amount <= 0 {
            return Err(CoreError::validation(format!(
                "credit amount must be positive, got {amount}"
            )));
        }
        self.db
            .balances()
            .ensure(user_id, self.starting_balance, now)
            .await?;
        self.db.balances().credit(user_id, amount).await
    }

    /// Remove funds, failing with `InsufficientBalance` (and mutating
    /// nothing) when the balance cannot cover it.
    pub async fn try_debit(
        &self,
        user_id: UserId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        if amount <= 0 {
            return Err(CoreError::validation(format!(
                "debit amount must be positive, got {amount}"
            )));
        }
        self.db
            .balances()
            .ensure(user_id, self.starting_balance, now)
            .await?;
        self.db.balances().try_debit(user_id, amount).await
    }

    /// Admin-facing signed delta that clamps at zero instead of failing.
    pub async fn adjust(
        &self,
        user_id: UserId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        self.db
            .balances()
            .ensure(user_id, self.starting_balance, now)
            .await?;
        let amount = self.db.balances().adjust(user_id, delta).await?;
        info!(user_id = %user_id, delta, amount, "Balance adjusted by admin");
        Ok(amount)
    }

    /// Top `k` balances, richest first, stable across equal amounts.
    pub async fn leaderboard(&self, k: i64) -> Result<Vec<BalanceRow>, CoreError> {
        self.db.balances().top(k).await
    }
}
