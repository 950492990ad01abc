//! Security Enforcement
//!
//! Tracks users excluded from the family and escalates punishment for
//! unauthorized structural changes to the community.
//!
//! ## Strike tiers
//!
//! ```text
//! violation ──► exempt? ──► yes ──► ignored, counter untouched
//!                  │
//!                  no
//!                  ▼
//!            count += 1 ──► 1: strip family standing
//!                           2: remove from community (kick)
//!                          ≥3: permanently exclude (ban)
//! ```
//!
//! The counter only moves up; `pardon` is an operator override, not a
//! decay timer. Enforcement actions go through [`EnforcementSink`] and
//! are best-effort: a refused kick leaves the incremented count in
//! place and shows up in the outcome instead.

mod blacklist;
mod strikes;

pub use blacklist::{BlacklistAdd, BlacklistService, RegrantAlert};
pub use strikes::{
    Enforcement, EnforcementSink, StrikeEscalator, StrikeTier, Violation, ViolationKind,
    ViolationOutcome,
};
