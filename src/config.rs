use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::{RoleId, UserId};

/// Configuration for the family core.
///
/// The moderation surface resolves this once at startup (environment or
/// its own config file) and passes it into [`crate::FamilyCore`]; nothing
/// in the core reads ambient global state afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Storage configuration
    pub database: DatabaseConfig,
    /// Balance, stake and game-odds configuration
    pub economy: EconomyConfig,
    /// Work-reward claim configuration
    pub work: WorkConfig,
    /// Recruitment application configuration
    pub applications: ApplicationConfig,
    /// Voice-session tracking configuration
    pub voice: VoiceConfig,
    /// Enforcement scope and family role mapping
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL (e.g. `sqlite://familia.db`)
    pub url: String,
    /// Connections held by the long-lived pool
    pub max_connections: u32,
    /// Create the database file when missing
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://familia.db".to_string(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

/// Odds and payout for a single casino game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameConfig {
    /// Probability of a winning draw, in `[0, 1]`
    pub win_probability: f64,
    /// Payout on a win, as a multiple of the stake
    pub payout_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Balance materialized on a user's first read (auto-enroll)
    pub starting_balance: i64,
    /// Smallest accepted stake
    pub min_stake: i64,
    /// Largest accepted stake
    pub max_stake: i64,
    /// Dice game odds
    pub dice: GameConfig,
    /// Slot machine odds
    pub slots: GameConfig,
    /// Chance game odds
    pub chance: GameConfig,
    /// Roulette odds (single-pocket bet on a 37-pocket wheel)
    pub roulette: GameConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000,
            min_stake: 10,
            max_stake: 100_000,
            dice: GameConfig {
                win_probability: 0.50,
                payout_multiplier: 2.0,
            },
            slots: GameConfig {
                win_probability: 0.20,
                payout_multiplier: 4.0,
            },
            chance: GameConfig {
                win_probability: 0.45,
                payout_multiplier: 2.0,
            },
            roulette: GameConfig {
                win_probability: 1.0 / 37.0,
                payout_multiplier: 36.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkConfig {
    /// Minimum interval between accepted reward claims, in seconds.
    /// Deployments run this anywhere from minutes to hours, so it is a
    /// parameter rather than a literal.
    pub claim_window_secs: u64,
    /// Smallest reward a claim can pay
    pub reward_min: i64,
    /// Largest reward a claim can pay
    pub reward_max: i64,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            claim_window_secs: 300,
            reward_min: 500,
            reward_max: 1_500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Enforce the submission window; the append-only log is kept either way
    pub gate_enabled: bool,
    /// Window within which only one application is accepted, in seconds
    pub window_secs: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            gate_enabled: true,
            window_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Sessions considered when summarizing a user's voice activity
    pub history_limit: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self { history_limit: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Owning operator; never struck regardless of attributed violations
    pub operator_id: UserId,
    /// Additional identities outside the enforcement scope
    pub exempt_user_ids: Vec<UserId>,
    /// Resolved family role IDs, used for regrant detection
    pub family_role_ids: Vec<RoleId>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            operator_id: 0,
            exempt_user_ids: Vec::new(),
            family_role_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            economy: EconomyConfig::default(),
            work: WorkConfig::default(),
            applications: ApplicationConfig::default(),
            voice: VoiceConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from `FAMILIA_*` environment variables on top of
    /// the documented defaults, then validate.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Database
        if let Ok(url) = env::var("FAMILIA_DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(n) = env::var("FAMILIA_DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = n
                .parse()
                .context("Invalid FAMILIA_DATABASE_MAX_CONNECTIONS value")?;
        }

        // Economy
        if let Ok(v) = env::var("FAMILIA_STARTING_BALANCE") {
            config.economy.starting_balance =
                v.parse().context("Invalid FAMILIA_STARTING_BALANCE value")?;
        }
        if let Ok(v) = env::var("FAMILIA_MIN_STAKE") {
            config.economy.min_stake = v.parse().context("Invalid FAMILIA_MIN_STAKE value")?;
        }
        if let Ok(v) = env::var("FAMILIA_MAX_STAKE") {
            config.economy.max_stake = v.parse().context("Invalid FAMILIA_MAX_STAKE value")?;
        }
        load_game_from_env("DICE", &mut config.economy.dice)?;
        load_game_from_env("SLOTS", &mut config.economy.slots)?;
        load_game_from_env("CHANCE", &mut config.economy.chance)?;
        load_game_from_env("ROULETTE", &mut config.economy.roulette)?;

        // Work rewards
        if let Ok(v) = env::var("FAMILIA_WORK_CLAIM_WINDOW_SECS") {
            config.work.claim_window_secs = v
                .parse()
                .context("Invalid FAMILIA_WORK_CLAIM_WINDOW_SECS value")?;
        }
        if let Ok(v) = env::var("FAMILIA_WORK_REWARD_MIN") {
            config.work.reward_min = v.parse().context("Invalid FAMILIA_WORK_REWARD_MIN value")?;
        }
        if let Ok(v) = env::var("FAMILIA_WORK_REWARD_MAX") {
            config.work.reward_max = v.parse().context("Invalid FAMILIA_WORK_REWARD_MAX value")?;
        }

        // Applications
        if let Ok(v) = env::var("FAMILIA_APPLICATION_GATE_ENABLED") {
            config.applications.gate_enabled = v
                .parse()
                .context("Invalid FAMILIA_APPLICATION_GATE_ENABLED value")?;
        }
        if let Ok(v) = env::var("FAMILIA_APPLICATION_WINDOW_SECS") {
            config.applications.window_secs = v
                .parse()
                .context("Invalid FAMILIA_APPLICATION_WINDOW_SECS value")?;
        }

        // Voice
        if let Ok(v) = env::var("FAMILIA_VOICE_HISTORY_LIMIT") {
            config.voice.history_limit = v
                .parse()
                .context("Invalid FAMILIA_VOICE_HISTORY_LIMIT value")?;
        }

        // Security scope
        if let Ok(v) = env::var("FAMILIA_OPERATOR_ID") {
            config.security.operator_id = v.parse().context("Invalid FAMILIA_OPERATOR_ID value")?;
        }
        if let Ok(v) = env::var("FAMILIA_EXEMPT_USER_IDS") {
            config.security.exempt_user_ids =
                parse_id_list(&v).context("Invalid FAMILIA_EXEMPT_USER_IDS value")?;
        }
        if let Ok(v) = env::var("FAMILIA_FAMILY_ROLE_IDS") {
            config.security.family_role_ids =
                parse_id_list(&v).context("Invalid FAMILIA_FAMILY_ROLE_IDS value")?;
        }

        // Logging
        if let Ok(v) = env::var("FAMILIA_LOG_LEVEL") {
            config.logging.level = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("database URL must not be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        if self.economy.starting_balance < 0 {
            anyhow::bail!("economy.starting_balance must not be negative");
        }
        if self.economy.min_stake < 1 {
            anyhow::bail!("economy.min_stake must be at least 1");
        }
        if self.economy.max_stake < self.economy.min_stake {
            anyhow::bail!(
                "economy.max_stake ({}) is below economy.min_stake ({})",
                self.economy.max_stake,
                self.economy.min_stake
            );
        }
        for (name, game) in [
            ("dice", &self.economy.dice),
            ("slots", &self.economy.slots),
            ("chance", &self.economy.chance),
            ("roulette", &self.economy.roulette),
        ] {
            if !(0.0..=1.0).contains(&game.win_probability) {
                anyhow::bail!(
                    "{} win_probability {} is outside [0, 1]",
                    name,
                    game.win_probability
                );
            }
            if !game.payout_multiplier.is_finite() || game.payout_multiplier < 0.0 {
                anyhow::bail!(
                    "{} payout_multiplier {} must be a non-negative number",
                    name,
                    game.payout_multiplier
                );
            }
        }
        if self.work.claim_window_secs == 0 {
            anyhow::bail!("work.claim_window_secs must be positive");
        }
        if self.work.reward_min < 0 || self.work.reward_max < self.work.reward_min {
            anyhow::bail!(
                "work reward range {}..{} is not a valid non-negative range",
                self.work.reward_min,
                self.work.reward_max
            );
        }
        if self.applications.window_secs == 0 {
            anyhow::bail!("applications.window_secs must be positive");
        }
        if self.voice.history_limit == 0 {
            anyhow::bail!("voice.history_limit must be at least 1");
        }
        Ok(())
    }
}

impl EconomyConfig {
    /// Odds for one game kind.
    pub fn game(&self, kind: crate::economy::GameKind) -> GameConfig {
        match kind {
            crate::economy::GameKind::Dice => self.dice,
            crate::economy::GameKind::Slots => self.slots,
            crate::economy::GameKind::Chance => self.chance,
            crate::economy::GameKind::Roulette => self.roulette,
        }
    }
}

impl WorkConfig {
    pub fn claim_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_window_secs as i64)
    }
}

impl ApplicationConfig {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs as i64)
    }
}

impl SecurityConfig {
    /// Whether a violation attributed to `actor` is outside the enforcement
    /// scope. Checked before any counter moves.
    pub fn is_exempt(&self, actor: UserId) -> bool {
        actor == self.operator_id || self.exempt_user_ids.contains(&actor)
    }

    /// Whether `role` is one of the resolved family roles.
    pub fn is_family_role(&self, role: RoleId) -> bool {
        self.family_role_ids.contains(&role)
    }
}

fn load_game_from_env(name: &str, game: &mut GameConfig) -> Result<()> {
    if let Ok(v) = env::var(format!("FAMILIA_{name}_WIN_PROBABILITY")) {
        game.win_probability = v
            .parse()
            .with_context(|| format!("Invalid FAMILIA_{name}_WIN_PROBABILITY value"))?;
    }
    if let Ok(v) = env::var(format!("FAMILIA_{name}_PAYOUT")) {
        game.payout_multiplier = v
            .parse()
            .with_context(|| format!("Invalid FAMILIA_{name}_PAYOUT value"))?;
    }
    Ok(())
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .with_context(|| format!("'{part}' is not a numeric ID"))
        })
        .collect()
}
