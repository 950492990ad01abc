//! Family Core - single assembly point for every service
//!
//! The moderation surface constructs this once at startup and calls into
//! it for everything; no service is wired up anywhere else.

use std::sync::Arc;
use tracing::info;

use crate::config::CoreConfig;
use crate::database::pool::DatabasePool;
use crate::database::settings::SettingsRepository;
use crate::economy::{Casino, EconomyLedger, WorkRewards};
use crate::error::CoreError;
use crate::recruitment::Recruitment;
use crate::security::{BlacklistService, EnforcementSink, StrikeEscalator};
use crate::voice::VoiceTracker;

/// Owns the store and every service built on it.
pub struct FamilyCore {
    config: CoreConfig,
    db: Arc<DatabasePool>,
    voice: VoiceTracker,
    economy: EconomyLedger,
    casino: Casino,
    work: WorkRewards,
    blacklist: BlacklistService,
    strikes: StrikeEscalator,
    recruitment: Recruitment,
}

impl FamilyCore {
    /// Connect to the configured database, apply the schema and wire up
    /// the services. The sink is the surface's implementation of the
    /// platform-side punishment actions.
    pub async fn connect(
        config: CoreConfig,
        sink: Arc<dyn EnforcementSink>,
    ) -> Result<Self, CoreError> {
        config
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let db = Arc::new(DatabasePool::new(&config.database).await?);
        db.init_schema().await?;

        info!("Family core ready");
        Ok(Self::assemble(config, db, sink))
    }

    /// Same assembly over a private in-memory store. Used by tests and
    /// by embedding code that wants a throwaway instance.
    pub async fn in_memory(
        config: CoreConfig,
        sink: Arc<dyn EnforcementSink>,
    ) -> Result<Self, CoreError> {
        config
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let db = Arc::new(DatabasePool::in_memory().await?);
        Ok(Self::assemble(config, db, sink))
    }

    fn assemble(config: CoreConfig, db: Arc<DatabasePool>, sink: Arc<dyn EnforcementSink>) -> Self {
        let voice = VoiceTracker::new(db.clone(), config.voice.history_limit);
        let economy = EconomyLedger::new(db.clone(), config.economy.starting_balance);
        let casino = Casino::new(db.clone(), config.economy.clone());
        let work = WorkRewards::new(
            db.clone(),
            config.work.clone(),
            config.economy.starting_balance,
        );
        let blacklist = BlacklistService::new(db.clone(), config.security.clone());
        let strikes = StrikeEscalator::new(db.clone(), config.security.clone(), sink);
        let recruitment = Recruitment::new(db.clone(), config.applications.clone());

        Self {
            config,
            db,
            voice,
            economy,
            casino,
            work,
            blacklist,
            strikes,
            recruitment,
        }
    }

    pub fn voice(&self) -> &VoiceTracker {
        &self.voice
    }

    pub fn economy(&self) -> &EconomyLedger {
        &self.economy
    }

    pub fn casino(&self) -> &Casino {
        &self.casino
    }

    pub fn work(&self) -> &WorkRewards {
        &self.work
    }

    pub fn blacklist(&self) -> &BlacklistService {
        &self.blacklist
    }

    pub fn strikes(&self) -> &StrikeEscalator {
        &self.strikes
    }

    pub fn recruitment(&self) -> &Recruitment {
        &self.recruitment
    }

    /// Admin-facing key/value settings (externalized role and channel
    /// IDs live here).
    pub fn settings(&self) -> &SettingsRepository {
        self.db.settings()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn database(&self) -> &DatabasePool {
        &self.db
    }
}
