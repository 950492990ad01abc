//! Voice Tracker - Session bookkeeping driven by gateway events

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::pool::DatabasePool;
use crate::database::sessions::VoiceSession;
use crate::error::CoreError;
use crate::{ChannelId, UserId};

/// What changed in a user's voice state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEventKind {
    Joined(ChannelId),
    Left,
    Moved { from: ChannelId, to: ChannelId },
}

/// One observed voice-state transition, as reported by the gateway.
#[derive(Debug, Clone, Copy)]
pub struct VoiceEvent {
    pub user_id: UserId,
    /// Bot accounts join channels for music playback and the like; their
    /// sessions are noise and are never stored.
    pub is_bot: bool,
    pub kind: VoiceEventKind,
    pub at: DateTime<Utc>,
}

/// Summary of a user's recent voice presence.
#[derive(Debug, Clone)]
pub struct VoiceActivity {
    /// Most-recent-first, capped at the configured history limit
    pub sessions: Vec<VoiceSession>,
    /// Summed elapsed time of `sessions`, open ones measured against the
    /// query time
    pub total_time: Duration,
    /// Channel the user is in right now, when a session is open
    pub current_channel: Option<ChannelId>,
}

/// Applies voice-state transitions to the session store.
pub struct VoiceTracker {
    db: Arc<DatabasePool>,
    history_limit: u32,
    /// Per-user transition locks; close-then-open must not interleave
    transition_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl VoiceTracker {
    pub fn new(db: Arc<DatabasePool>, history_limit: u32) -> Self {
        Self {
            db,
            history_limit,
            transition_locks: DashMap::new(),
        }
    }

    /// Record one transition. Out-of-sync states are tolerated: leaving
    /// with nothing open is a no-op, joining with something open closes
    /// the stale row first.
    pub async fn handle_event(&self, event: VoiceEvent) -> Result<(), CoreError> {
        if event.is_bot {
            debug!(user_id = %event.user_id, "Ignoring bot voice event");
            return Ok(());
        }

        let lock = self
            .transition_locks
            .entry(event.user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        match event.kind {
            VoiceEventKind::Joined(channel_id) => {
                let stale = self.db.sessions().close_open(event.user_id, event.at).await?;
                if stale > 0 {
                    warn!(
                        user_id = %event.user_id,
                        stale,
                        "Closed stale open session before join"
                    );
                }
                self.db
                    .sessions()
                    .open(event.user_id, channel_id, event.at)
                    .await?;
                info!(user_id = %event.user_id, channel_id = %channel_id, "Voice session started");
            }
            VoiceEventKind::Left => {
                let closed = self.db.sessions().close_open(event.user_id, event.at).await?;
                if closed == 0 {
                    debug!(user_id = %event.user_id, "Leave event with no open session");
                } else {
                    info!(user_id = %event.user_id, "Voice session ended");
                }
            }
            VoiceEventKind::Moved { from, to } => {
                // Two statements, close then open. A crash in between
                // leaves no open row, which the next event tolerates.
                self.db.sessions().close_open(event.user_id, event.at).await?;
                self.db.sessions().open(event.user_id, to, event.at).await?;
                info!(
                    user_id = %event.user_id,
                    from = %from,
                    to = %to,
                    "Voice session moved"
                );
            }
        }

        Ok(())
    }

    /// Recent sessions plus their summed duration. An open session counts
    /// as ongoing, measured against `now`.
    pub async fn activity(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<VoiceActivity, CoreError> {
        let sessions = self
            .db
            .sessions()
            .recent(user_id, i64::from(self.history_limit))
            .await?;

        let total_time = sessions
            .iter()
            .fold(Duration::zero(), |acc, session| acc + session.elapsed(now));

        let current_channel = sessions
            .iter()
            .find(|session| session.ended_at.is_none())
            .map(|session| session.channel_id);

        Ok(VoiceActivity {
            sessions,
            total_time,
            current_channel,
        })
    }

    /// Channel the user currently occupies, if any.
    pub async fn current_channel(&self, user_id: UserId) -> Result<Option<ChannelId>, CoreError> {
        Ok(self
            .db
            .sessions()
            .open_session(user_id)
            .await?
            .map(|session| session.channel_id))
    }
}
