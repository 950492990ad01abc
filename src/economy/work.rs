//! Work Rewards - periodic claimable payouts behind a fixed-window gate

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::WorkConfig;
use crate::cooldown::{self, CooldownStatus};
use crate::database::pool::DatabasePool;
use crate::error::CoreError;
use crate::UserId;

/// Result of a claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Reward paid out and the claim stamp advanced
    Claimed { amount: i64, balance_after: i64 },
    /// Still inside the window; nothing was written
    OnCooldown { retry_at: DateTime<Utc> },
}

/// Pays a random reward per claim, at most once per configured window.
pub struct WorkRewards {
    db: Arc<DatabasePool>,
    config: WorkConfig,
    starting_balance: i64,
    /// Per-user claim locks; the gate check and the credit must not
    /// interleave for the same user
    claim_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl WorkRewards {
    pub fn new(db: Arc<DatabasePool>, config: WorkConfig, starting_balance: i64) -> Self {
        Self {
            db,
            config,
            starting_balance,
            claim_locks: DashMap::new(),
        }
    }

    /// Attempt a claim. A denied attempt leaves the stamp alone, so the
    /// retry time never drifts from failed tries.
    pub async fn claim(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<WorkOutcome, CoreError> {
        let lock = self
            .claim_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let last = self.db.cooldowns().last_work_claim(user_id).await?;
        match cooldown::since_last(last, self.config.claim_window(), now) {
            CooldownStatus::Blocked { retry_at } => Ok(WorkOutcome::OnCooldown { retry_at }),
            CooldownStatus::Ready => {
                let amount = rng.gen_range(self.config.reward_min..=self.config.reward_max);

                self.db
                    .balances()
                    .ensure(user_id, self.starting_balance, now)
                    .await?;
                let balance_after = self.db.balances().credit(user_id, amount).await?;
                self.db.cooldowns().record_work_claim(user_id, now).await?;

                info!(user_id = %user_id, amount, balance_after, "Work reward claimed");
                Ok(WorkOutcome::Claimed {
                    amount,
                    balance_after,
                })
            }
        }
    }
}
