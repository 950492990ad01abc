//! Strike Escalator - monotonic violation counter with tiered enforcement

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::database::pool::DatabasePool;
use crate::error::CoreError;
use crate::UserId;

/// Structural changes that count as violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    ChannelDeleted,
    ChannelEdited,
    RoleDeleted,
    RoleEdited,
}

impl ViolationKind {
    pub fn description(&self) -> &'static str {
        match self {
            ViolationKind::ChannelDeleted => "Deleted a channel",
            ViolationKind::ChannelEdited => "Edited a channel without authorization",
            ViolationKind::RoleDeleted => "Deleted a role",
            ViolationKind::RoleEdited => "Edited a role without authorization",
        }
    }
}

/// One detected violation, attributed to the actor the audit log named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub actor: UserId,
    pub kind: ViolationKind,
    pub at: DateTime<Utc>,
    /// Context for the alert message (JSON-serializable)
    pub evidence: serde_json::Value,
}

impl Violation {
    pub fn new(actor: UserId, kind: ViolationKind, at: DateTime<Utc>) -> Self {
        Self {
            actor,
            kind,
            at,
            evidence: serde_json::Value::Null,
        }
    }

    pub fn channel_deleted(actor: UserId, channel_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            actor,
            kind: ViolationKind::ChannelDeleted,
            at,
            evidence: serde_json::json!({ "channel_id": channel_id }),
        }
    }

    pub fn role_deleted(actor: UserId, role_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            actor,
            kind: ViolationKind::RoleDeleted,
            at,
            evidence: serde_json::json!({ "role_id": role_id }),
        }
    }
}

/// Punishment tier, a deterministic function of the post-increment count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeTier {
    /// First strike: family standing is stripped
    StripStanding,
    /// Second strike: removed from the community
    Kick,
    /// Third and beyond: permanently excluded
    Ban,
}

impl StrikeTier {
    pub fn for_count(count: i64) -> Self {
        match count {
            i64::MIN..=1 => StrikeTier::StripStanding,
            2 => StrikeTier::Kick,
            _ => StrikeTier::Ban,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrikeTier::StripStanding => "strip family standing",
            StrikeTier::Kick => "remove from community",
            StrikeTier::Ban => "permanently exclude",
        }
    }
}

/// How the enforcement side effect went. `Failed` never rolls the
/// counter back; the action is independently retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    Completed,
    Failed { reason: String },
}

/// Result of reporting a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationOutcome {
    /// Actor is outside the enforcement scope; nothing was recorded
    Exempt,
    Struck {
        count: i64,
        tier: StrikeTier,
        enforcement: Enforcement,
    },
}

/// Platform-side punishment actions, implemented by the moderation
/// surface. Failures are reported, never retried here.
#[async_trait]
pub trait EnforcementSink: Send + Sync {
    async fn strip_standing(&self, user_id: UserId) -> Result<(), CoreError>;
    async fn kick(&self, user_id: UserId) -> Result<(), CoreError>;
    async fn ban(&self, user_id: UserId) -> Result<(), CoreError>;
}

/// Applies the strike state machine to attributed violations.
pub struct StrikeEscalator {
    db: Arc<DatabasePool>,
    security: SecurityConfig,
    sink: Arc<dyn EnforcementSink>,
}

impl StrikeEscalator {
    pub fn new(
        db: Arc<DatabasePool>,
        security: SecurityConfig,
        sink: Arc<dyn EnforcementSink>,
    ) -> Self {
        Self { db, security, sink }
    }

    /// Count a violation and apply the mapped punishment. Exemption is
    /// checked before the counter moves, so operators can restructure
    /// the community without collecting strikes.
    pub async fn report_violation(
        &self,
        violation: &Violation,
    ) -> Result<ViolationOutcome, CoreError> {
        if self.security.is_exempt(violation.actor) {
            debug!(actor = %violation.actor, "Violation by exempt actor ignored");
            return Ok(ViolationOutcome::Exempt);
        }

        let count = self.db.strikes().increment(violation.actor, violation.at).await?;
        let tier = StrikeTier::for_count(count);

        warn!(
            actor = %violation.actor,
            violation = violation.kind.description(),
            evidence = %violation.evidence,
            count,
            action = tier.description(),
            "Security violation recorded"
        );

        let result = match tier {
            StrikeTier::StripStanding => self.sink.strip_standing(violation.actor).await,
            StrikeTier::Kick => self.sink.kick(violation.actor).await,
            StrikeTier::Ban => self.sink.ban(violation.actor).await,
        };

        let enforcement = match result {
            Ok(()) => Enforcement::Completed,
            Err(e) => {
                // The count stays; the surface retries the action on its
                // own schedule.
                warn!(
                    actor = %violation.actor,
                    action = tier.description(),
                    error = %e,
                    "Enforcement action failed"
                );
                Enforcement::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(ViolationOutcome::Struck {
            count,
            tier,
            enforcement,
        })
    }

    /// Current strike count, zero when the user has none.
    pub async fn count(&self, user_id: UserId) -> Result<i64, CoreError> {
        self.db.strikes().count(user_id).await
    }

    /// Operator override wiping the counter. Returns `false` when there
    /// was nothing to clear.
    pub async fn pardon(&self, user_id: UserId) -> Result<bool, CoreError> {
        let cleared = self.db.strikes().reset(user_id).await?;
        if cleared {
            info!(user_id = %user_id, "Strikes pardoned");
        }
        Ok(cleared)
    }
}
