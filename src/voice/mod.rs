//! Voice Session Tracking
//!
//! Converts gateway voice-state transitions into stored sessions, one row
//! per continuous stay in one channel.
//!
//! ## State machine
//!
//! ```text
//!            Joined(c)                    Left
//! ┌────────┐ ─────────► ┌──────────────┐ ─────► ┌────────┐
//! │ Absent │            │ InChannel(c) │        │ Absent │
//! └────────┘            └──────────────┘        └────────┘
//!                          │        ▲
//!                          └────────┘
//!                        Moved{c → c'}
//!                     (close c, open c')
//! ```
//!
//! Events from bot accounts are dropped before they touch storage, and
//! every transition runs under a per-user lock so a reconnect storm
//! cannot interleave half-finished transitions.

mod tracker;

pub use tracker::{VoiceActivity, VoiceEvent, VoiceEventKind, VoiceTracker};
