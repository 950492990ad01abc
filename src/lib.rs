//! Familia Core
//!
//! Persistence and enforcement core for a game-family community bot:
//! voice-session tracking, a virtual-currency economy with casino games
//! and work rewards, recruitment intake, and blacklist/strike security
//! enforcement. The chat-platform surface (commands, embeds, gateway)
//! is an external collaborator that drives this crate through
//! [`FamilyCore`].
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── core.rs        - FamilyCore assembly point
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Error taxonomy
//! ├── logging.rs     - Tracing subscriber setup
//! ├── cooldown.rs    - Pure rate-limit decisions
//! ├── voice/         - Voice session tracking
//! │   └── tracker.rs - Gateway-event state machine
//! ├── economy/       - Virtual currency
//! │   ├── ledger.rs  - Balances and leaderboard
//! │   ├── games.rs   - Casino games
//! │   └── work.rs    - Periodic work rewards
//! ├── security/      - Enforcement
//! │   ├── blacklist.rs - Exclusion roster, regrant detection
//! │   └── strikes.rs   - Violation counter and tiers
//! ├── recruitment.rs - Applications and profiles
//! └── database/      - SQLite persistence (one repository per table)
//! ```

pub mod config;
pub mod cooldown;
pub mod core;
pub mod database;
pub mod economy;
pub mod error;
pub mod logging;
pub mod recruitment;
pub mod security;
pub mod voice;

/// Externally supplied numeric user identifier. The core never mints
/// identifiers of its own.
pub type UserId = i64;
/// Externally supplied numeric voice-channel identifier.
pub type ChannelId = i64;
/// Externally supplied numeric role identifier.
pub type RoleId = i64;

// Re-export main types for convenience
pub use config::{
    ApplicationConfig, CoreConfig, DatabaseConfig, EconomyConfig, GameConfig, LoggingConfig,
    SecurityConfig, VoiceConfig, WorkConfig,
};
pub use crate::core::FamilyCore;
pub use error::CoreError;
pub use logging::init_logging;

// Re-export storage types
pub use database::{
    Application, ApplicationStatus, BalanceRow, BlacklistEntry, DatabasePool, Profile,
    VoiceSession,
};

// Re-export service types
pub use cooldown::CooldownStatus;
pub use economy::{Bet, Casino, EconomyLedger, GameKind, PlayOutcome, PlayReceipt, WorkOutcome, WorkRewards};
pub use recruitment::{Recruitment, SubmitOutcome, NICKNAME_MAX_CHARS, STATIC_ID_MAX_CHARS};
pub use security::{
    BlacklistAdd, BlacklistService, Enforcement, EnforcementSink, RegrantAlert, StrikeEscalator,
    StrikeTier, Violation, ViolationKind, ViolationOutcome,
};
pub use voice::{VoiceActivity, VoiceEvent, VoiceEventKind, VoiceTracker};
