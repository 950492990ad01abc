//! Database Connection Pool using sqlx

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::balances::BalanceRepository;
use crate::database::blacklist::BlacklistRepository;
use crate::database::casino_bans::CasinoBanRepository;
use crate::database::cooldowns::CooldownRepository;
use crate::database::profiles::ProfileRepository;
use crate::database::sessions::VoiceSessionRepository;
use crate::database::settings::SettingsRepository;
use crate::database::strikes::StrikeRepository;
use crate::error::CoreError;

/// Owns the long-lived SQLite pool and hands out one repository per
/// aggregate. Constructed once at startup; everything else borrows it.
pub struct DatabasePool {
    pool: SqlitePool,
    sessions: VoiceSessionRepository,
    balances: BalanceRepository,
    casino_bans: CasinoBanRepository,
    cooldowns: CooldownRepository,
    blacklist: BlacklistRepository,
    strikes: StrikeRepository,
    profiles: ProfileRepository,
    settings: SettingsRepository,
}

impl DatabasePool {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(config.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(url = %config.url, "Connected to SQLite");

        Ok(Self::from_pool(pool))
    }

    /// Private in-memory store with the schema applied. One connection,
    /// since every `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self::from_pool(pool);
        db.init_schema().await?;
        Ok(db)
    }

    fn from_pool(pool: SqlitePool) -> Self {
        let sessions = VoiceSessionRepository::new(pool.clone());
        let balances = BalanceRepository::new(pool.clone());
        let casino_bans = CasinoBanRepository::new(pool.clone());
        let cooldowns = CooldownRepository::new(pool.clone());
        let blacklist = BlacklistRepository::new(pool.clone());
        let strikes = StrikeRepository::new(pool.clone());
        let profiles = ProfileRepository::new(pool.clone());
        let settings = SettingsRepository::new(pool.clone());

        Self {
            pool,
            sessions,
            balances,
            casino_bans,
            cooldowns,
            blacklist,
            strikes,
            profiles,
            settings,
        }
    }

    /// Create every table the core uses. Idempotent, runs at startup.
    pub async fn init_schema(&self) -> Result<(), CoreError> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voice_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_voice_sessions_user \
             ON voice_sessions (user_id, started_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS balances (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                amount INTEGER NOT NULL DEFAULT 0,
                enrolled_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS casino_bans (
                user_id INTEGER PRIMARY KEY,
                banned_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS work_cooldowns (
                user_id INTEGER PRIMARY KEY,
                last_claim_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                submitted_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_applications_user \
             ON applications (user_id, submitted_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blacklist (
                user_id INTEGER PRIMARY KEY,
                reason TEXT NOT NULL,
                added_by INTEGER NOT NULL,
                added_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS security_strikes (
                user_id INTEGER PRIMARY KEY,
                strike_count INTEGER NOT NULL DEFAULT 0,
                last_violation_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY,
                nickname TEXT NOT NULL,
                static_id TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn sessions(&self) -> &VoiceSessionRepository {
        &self.sessions
    }

    pub fn balances(&self) -> &BalanceRepository {
        &self.balances
    }

    pub fn casino_bans(&self) -> &CasinoBanRepository {
        &self.casino_bans
    }

    pub fn cooldowns(&self) -> &CooldownRepository {
        &self.cooldowns
    }

    pub fn blacklist(&self) -> &BlacklistRepository {
        &self.blacklist
    }

    pub fn strikes(&self) -> &StrikeRepository {
        &self.strikes
    }

    pub fn profiles(&self) -> &ProfileRepository {
        &self.profiles
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
