//! SQLite Database Module
//!
//! Provides persistence for voice sessions, balances, cooldowns,
//! applications, the blacklist, security strikes, profiles and settings.

pub mod balances;
pub mod blacklist;
pub mod casino_bans;
pub mod cooldowns;
pub mod pool;
pub mod profiles;
pub mod sessions;
pub mod settings;
pub mod strikes;

pub use balances::{BalanceRepository, BalanceRow};
pub use blacklist::{BlacklistEntry, BlacklistRepository};
pub use casino_bans::CasinoBanRepository;
pub use cooldowns::{Application, ApplicationStatus, CooldownRepository};
pub use pool::DatabasePool;
pub use profiles::{Profile, ProfileRepository};
pub use sessions::{VoiceSession, VoiceSessionRepository};
pub use settings::SettingsRepository;
pub use strikes::StrikeRepository;
