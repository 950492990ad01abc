//! Runtime error taxonomy
//!
//! Domain rejections that the moderation surface renders as part of a
//! normal reply (cooldown hit, strike tier, already-blacklisted) are
//! outcome enums on the individual services, not errors. This enum covers
//! the cases where an operation cannot proceed at all.

use thiserror::Error;

/// Errors surfaced by core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input (bad stake, oversized nickname,
    /// roulette pocket outside 0..=36). Nothing was mutated.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A debit was requested that the balance cannot cover. Nothing was
    /// mutated.
    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: i64, available: i64 },

    /// A referenced row or required setting does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The platform refused an enforcement side effect (missing
    /// privilege). Core state already committed stays committed.
    #[error("Permission denied while {action}: {detail}")]
    PermissionDenied { action: String, detail: String },

    /// The underlying store failed; fatal to the triggering operation.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn permission_denied(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
            detail: detail.into(),
        }
    }
}
