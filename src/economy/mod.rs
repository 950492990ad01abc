//! Virtual Currency Economy
//!
//! Per-user integer balances with a zero floor, casino games staking
//! them, and periodic work rewards topping them up.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌─────────────┐
//! │ Casino       │────►│ EconomyLedger     │◄────│ WorkRewards │
//! │ (games/bets) │     │ (balances, top-K) │     │ (claims)    │
//! └──────────────┘     └───────────────────┘     └─────────────┘
//!                               │
//!                               ▼
//!                      ┌───────────────────┐
//!                      │ BalanceRepository │
//!                      │ (atomic SQL)      │
//!                      └───────────────────┘
//! ```
//!
//! ## Money model
//!
//! - Balances are plain `i64` amounts, never negative
//! - First read enrolls the user at the configured starting balance
//! - Stakes are debited before the draw; payouts credited after
//! - Admin overwrites clamp below-zero values to zero

mod games;
mod ledger;
mod work;

pub use games::{Bet, Casino, GameKind, PlayOutcome, PlayReceipt};
pub use ledger::EconomyLedger;
pub use work::{WorkOutcome, WorkRewards};
