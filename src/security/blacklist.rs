//! Blacklist Service - exclusion roster and regrant detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::database::blacklist::BlacklistEntry;
use crate::database::pool::DatabasePool;
use crate::error::CoreError;
use crate::{RoleId, UserId};

/// What an `add` call did. Membership is single per user either way;
/// the moderation surface words its reply off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistAdd {
    NewlyListed,
    /// The user was already listed; the stored reason was replaced
    ReasonUpdated,
}

/// A blacklisted user was handed a family role again. The core only
/// reports it; pulling the role back is the surface's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegrantAlert {
    pub user_id: UserId,
    /// The granted roles that are family roles
    pub offending_roles: Vec<RoleId>,
    /// Stored blacklist reason, for the alert message
    pub reason: String,
}

/// Records who is excluded from the family and why.
pub struct BlacklistService {
    db: Arc<DatabasePool>,
    security: SecurityConfig,
}

impl BlacklistService {
    pub fn new(db: Arc<DatabasePool>, security: SecurityConfig) -> Self {
        Self { db, security }
    }

    /// List a user. Re-listing overwrites the reason and attribution
    /// instead of stacking entries.
    pub async fn add(
        &self,
        user_id: UserId,
        reason: &str,
        added_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<BlacklistAdd, CoreError> {
        let already_listed = self.db.blacklist().get(user_id).await?.is_some();

        let entry = BlacklistEntry {
            user_id,
            reason: reason.to_string(),
            added_by,
            added_at: at,
        };
        self.db.blacklist().upsert(&entry).await?;

        if already_listed {
            info!(user_id = %user_id, added_by = %added_by, "Blacklist reason updated");
            Ok(BlacklistAdd::ReasonUpdated)
        } else {
            info!(user_id = %user_id, added_by = %added_by, "User blacklisted");
            Ok(BlacklistAdd::NewlyListed)
        }
    }

    /// Unlist a user. Returns `false` when they were not listed.
    pub async fn remove(&self, user_id: UserId) -> Result<bool, CoreError> {
        let removed = self.db.blacklist().remove(user_id).await?;
        if removed {
            info!(user_id = %user_id, "User removed from blacklist");
        }
        Ok(removed)
    }

    pub async fn is_blacklisted(&self, user_id: UserId) -> Result<bool, CoreError> {
        Ok(self.db.blacklist().get(user_id).await?.is_some())
    }

    pub async fn reason(&self, user_id: UserId) -> Result<Option<String>, CoreError> {
        Ok(self
            .db
            .blacklist()
            .get(user_id)
            .await?
            .map(|entry| entry.reason))
    }

    /// Full roster for rendering.
    pub async fn entries(&self) -> Result<Vec<BlacklistEntry>, CoreError> {
        self.db.blacklist().all().await
    }

    /// Check a role grant against the roster. Fires only when a listed
    /// user receives at least one configured family role.
    pub async fn review_role_grant(
        &self,
        user_id: UserId,
        granted_roles: &[RoleId],
    ) -> Result<Option<RegrantAlert>, CoreError> {
        let offending: Vec<RoleId> = granted_roles
            .iter()
            .copied()
            .filter(|role| self.security.is_family_role(*role))
            .collect();
        if offending.is_empty() {
            return Ok(None);
        }

        let entry = match self.db.blacklist().get(user_id).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        warn!(
            user_id = %user_id,
            roles = ?offending,
            "Blacklisted user was granted family roles"
        );
        Ok(Some(RegrantAlert {
            user_id,
            offending_roles: offending,
            reason: entry.reason,
        }))
    }
}
