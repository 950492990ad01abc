//! Recruitment - application intake, decisions and member profiles
//!
//! Submissions pass the application gate and land in an append-only log;
//! the decision flow marks them approved or rejected afterwards. The
//! profile fields mirror what the intake form collects.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::ApplicationConfig;
use crate::cooldown::{self, CooldownStatus};
use crate::database::cooldowns::{Application, ApplicationStatus};
use crate::database::pool::DatabasePool;
use crate::database::profiles::Profile;
use crate::error::CoreError;
use crate::UserId;

/// Longest accepted in-game nickname, matching the intake form field.
pub const NICKNAME_MAX_CHARS: usize = 32;
/// Longest accepted static ID, matching the intake form field.
pub const STATIC_ID_MAX_CHARS: usize = 10;

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Logged as pending; the id references it in the decision flow
    Accepted { application_id: i64 },
    /// Inside the submission window; nothing was written
    OnCooldown { retry_at: DateTime<Utc> },
}

/// Handles applications to join the family.
pub struct Recruitment {
    db: Arc<DatabasePool>,
    config: ApplicationConfig,
}

impl Recruitment {
    pub fn new(db: Arc<DatabasePool>, config: ApplicationConfig) -> Self {
        Self { db, config }
    }

    /// Accept one application per window per user. With the gate
    /// disabled every submission is accepted, but the log keeps growing
    /// either way.
    pub async fn submit(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<SubmitOutcome, CoreError> {
        if self.config.gate_enabled {
            let window = self.config.window();
            let submitted = self
                .db
                .cooldowns()
                .applications_since(user_id, at - window)
                .await?;
            let newest = self
                .db
                .cooldowns()
                .recent_applications(user_id, 1)
                .await?
                .first()
                .map(|application| application.submitted_at);

            if let CooldownStatus::Blocked { retry_at } =
                cooldown::within_budget(submitted, 1, newest, window)
            {
                return Ok(SubmitOutcome::OnCooldown { retry_at });
            }
        }

        let application_id = self.db.cooldowns().insert_application(user_id, at).await?;
        info!(user_id = %user_id, application_id, "Application submitted");
        Ok(SubmitOutcome::Accepted { application_id })
    }

    /// Record the decision. Returns `false` for an unknown id, a
    /// reported no-op.
    pub async fn decide(&self, application_id: i64, approved: bool) -> Result<bool, CoreError> {
        let status = if approved {
            ApplicationStatus::Approved
        } else {
            ApplicationStatus::Rejected
        };
        self.db
            .cooldowns()
            .set_application_status(application_id, status)
            .await
    }

    /// Most-recent-first submissions for one user.
    pub async fn history(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Application>, CoreError> {
        self.db.cooldowns().recent_applications(user_id, limit).await
    }

    /// Store the member's identity card. Fields are free text; only the
    /// form's length limits apply.
    pub async fn save_profile(
        &self,
        user_id: UserId,
        nickname: &str,
        static_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if nickname.chars().count() > NICKNAME_MAX_CHARS {
            return Err(CoreError::validation(format!(
                "nickname exceeds {NICKNAME_MAX_CHARS} characters"
            )));
        }
        if static_id.chars().count() > STATIC_ID_MAX_CHARS {
            return Err(CoreError::validation(format!(
                "static ID exceeds {STATIC_ID_MAX_CHARS} characters"
            )));
        }

        let profile = Profile {
            user_id,
            nickname: nickname.to_string(),
            static_id: static_id.to_string(),
            updated_at: at,
        };
        self.db.profiles().upsert(&profile).await
    }

    pub async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, CoreError> {
        self.db.profiles().get(user_id).await
    }
}
