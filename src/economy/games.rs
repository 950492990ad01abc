//! Casino Games - staked plays against configured odds
//!
//! Every game has the same shape: validate the stake, debit it, make one
//! random draw against the game's win probability, credit the payout on a
//! win. The draw happens after the debit has committed, so an interrupted
//! play can lose a stake but never mint one.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::EconomyConfig;
use crate::database::pool::DatabasePool;
use crate::error::CoreError;
use crate::UserId;

pub const ROULETTE_MAX_POCKET: u8 = 36;

/// The four supported games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Dice,
    Slots,
    Chance,
    Roulette,
}

impl GameKind {
    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::Slots => "slots",
            GameKind::Chance => "chance",
            GameKind::Roulette => "roulette",
        }
    }
}

/// A placed bet. Roulette carries the chosen pocket; the other games
/// take no parameters beyond the stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bet {
    Dice,
    Slots,
    Chance,
    Roulette { pocket: u8 },
}

impl Bet {
    pub fn kind(&self) -> GameKind {
        match self {
            Bet::Dice => GameKind::Dice,
            Bet::Slots => GameKind::Slots,
            Bet::Chance => GameKind::Chance,
            Bet::Roulette { .. } => GameKind::Roulette,
        }
    }
}

/// Settled play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayReceipt {
    pub kind: GameKind,
    pub stake: i64,
    pub won: bool,
    /// Credited on a win, zero on a loss
    pub payout: i64,
    pub balance_after: i64,
}

/// Result of a play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The stake was resolved
    Played(PlayReceipt),
    /// The user is barred from the casino; nothing was mutated
    Barred,
}

/// Runs the games against the ledger.
pub struct Casino {
    db: Arc<DatabasePool>,
    config: EconomyConfig,
}

impl Casino {
    pub fn new(db: Arc<DatabasePool>, config: EconomyConfig) -> Self {
        Self { db, config }
    }

    /// Play one game. The stake is debited before the draw; the net
    /// effect is always `balance - stake + payout`.
    ///
    /// The caller supplies the generator so deterministic tests can seed
    /// one; production call-sites pass `rand::thread_rng()`.
    pub async fn play(
        &self,
        user_id: UserId,
        bet: Bet,
        stake: i64,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<PlayOutcome, CoreError> {
        if stake < self.config.min_stake || stake > self.config.max_stake {
            return Err(CoreError::validation(format!(
                "stake {stake} is outside {}..={}",
                self.config.min_stake, self.config.max_stake
            )));
        }
        if let Bet::Roulette { pocket } = bet {
            if pocket > ROULETTE_MAX_POCKET {
                return Err(CoreError::validation(format!(
                    "roulette pocket {pocket} is outside 0..={ROULETTE_MAX_POCKET}"
                )));
            }
        }

        if self.db.casino_bans().is_banned(user_id).await? {
            debug!(user_id = %user_id, "Casino play refused, user is barred");
            return Ok(PlayOutcome::Barred);
        }

        let kind = bet.kind();
        let odds = self.config.game(kind);

        self.db
            .balances()
            .ensure(user_id, self.config.starting_balance, now)
            .await?;
        let after_debit = self.db.balances().try_debit(user_id, stake).await?;

        // The single draw that decides the play.
        let won = rng.gen_bool(odds.win_probability);

        let (payout, balance_after) = if won {
            let payout = (stake as f64 * odds.payout_multiplier).round() as i64;
            let balance_after = self.db.balances().credit(user_id, payout).await?;
            (payout, balance_after)
        } else {
            (0, after_debit)
        };

        info!(
            user_id = %user_id,
            game = kind.name(),
            stake,
            won,
            payout,
            balance_after,
            "Casino play settled"
        );

        Ok(PlayOutcome::Played(PlayReceipt {
            kind,
            stake,
            won,
            payout,
            balance_after,
        }))
    }

    /// Bar a user from all games. Their balance is untouched.
    pub async fn bar_from_games(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.db.casino_bans().ban(user_id, now).await
    }

    /// Re-admit a barred user. Returns `false` when they were not barred.
    pub async fn readmit_to_games(&self, user_id: UserId) -> Result<bool, CoreError> {
        self.db.casino_bans().lift(user_id).await
    }

    pub async fn is_barred(&self, user_id: UserId) -> Result<bool, CoreError> {
        self.db.casino_bans().is_banned(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn rigged(config: &mut EconomyConfig, probability: f64) {
        config.dice.win_probability = probability;
        config.slots.win_probability = probability;
        config.chance.win_probability = probability;
        config.roulette.win_probability = probability;
    }

    async fn casino_with(probability: f64) -> Casino {
        let db = Arc::new(DatabasePool::in_memory().await.unwrap());
        let mut config = EconomyConfig::default();
        rigged(&mut config, probability);
        Casino::new(db, config)
    }

    #[tokio::test]
    async fn test_losing_play_costs_exactly_the_stake() {
        let casino = casino_with(0.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = casino.play(1, Bet::Dice, 1_000, now(), &mut rng).await.unwrap();
        match outcome {
            PlayOutcome::Played(receipt) => {
                assert!(!receipt.won);
                assert_eq!(receipt.payout, 0);
                assert_eq!(receipt.balance_after, 9_000);
            }
            PlayOutcome::Barred => panic!("user is not barred"),
        }
    }

    #[tokio::test]
    async fn test_winning_play_credits_stake_times_multiplier() {
        let casino = casino_with(1.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = casino.play(1, Bet::Dice, 1_000, now(), &mut rng).await.unwrap();
        match outcome {
            PlayOutcome::Played(receipt) => {
                assert!(receipt.won);
                assert_eq!(receipt.payout, 2_000);
                assert_eq!(receipt.balance_after, 11_000);
            }
            PlayOutcome::Barred => panic!("user is not barred"),
        }
    }

    #[tokio::test]
    async fn test_play_lands_only_on_the_two_reachable_balances() {
        let casino = casino_with(0.5).await;
        let mut rng = StdRng::seed_from_u64(42);

        for round in 0..20 {
            let user = 100 + round;
            let outcome = casino.play(user, Bet::Chance, 1_000, now(), &mut rng).await.unwrap();
            match outcome {
                PlayOutcome::Played(receipt) => {
                    assert!(
                        receipt.balance_after == 9_000 || receipt.balance_after == 11_000,
                        "balance {} outside reachable set",
                        receipt.balance_after
                    );
                }
                PlayOutcome::Barred => panic!("user is not barred"),
            }
        }
    }

    #[tokio::test]
    async fn test_stake_outside_configured_range_is_rejected() {
        let casino = casino_with(1.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        let err = casino.play(1, Bet::Dice, 5, now(), &mut rng).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = casino
            .play(1, Bet::Dice, 10_000_000, now(), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_roulette_pocket_out_of_range_is_rejected() {
        let casino = casino_with(1.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        let err = casino
            .play(1, Bet::Roulette { pocket: 37 }, 100, now(), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let ok = casino
            .play(1, Bet::Roulette { pocket: 36 }, 100, now(), &mut rng)
            .await
            .unwrap();
        assert!(matches!(ok, PlayOutcome::Played(_)));
    }

    #[tokio::test]
    async fn test_barred_user_cannot_play_and_keeps_balance() {
        let casino = casino_with(1.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        casino.bar_from_games(1, now()).await.unwrap();
        let outcome = casino.play(1, Bet::Slots, 500, now(), &mut rng).await.unwrap();
        assert_eq!(outcome, PlayOutcome::Barred);

        casino.readmit_to_games(1).await.unwrap();
        let outcome = casino.play(1, Bet::Slots, 500, now(), &mut rng).await.unwrap();
        match outcome {
            // First touch of the ledger happens here, so the stake comes
            // off the starting balance.
            PlayOutcome::Played(receipt) => assert_eq!(receipt.balance_after, 11_500),
            PlayOutcome::Barred => panic!("ban was lifted"),
        }
    }

    #[tokio::test]
    async fn test_insufficient_stake_leaves_balance_alone() {
        let casino = casino_with(1.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        // Drain the account below the stake first.
        casino
            .db
            .balances()
            .set(1, 200, now())
            .await
            .unwrap();

        let err = casino.play(1, Bet::Dice, 1_000, now(), &mut rng).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));

        let remaining = casino.db.balances().ensure(1, 10_000, now()).await.unwrap();
        assert_eq!(remaining, 200);
    }
}
