//! Integration tests for the family core
//!
//! These tests drive full flows through `FamilyCore` over an in-memory
//! store: voice tracking, the economy and casino, cooldown gates,
//! blacklist and strike enforcement, and recruitment.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;

use familia_core::{
    Bet, BlacklistAdd, CoreConfig, CoreError, Enforcement, EnforcementSink, FamilyCore,
    PlayOutcome, StrikeTier, SubmitOutcome, UserId, Violation, ViolationKind, ViolationOutcome,
    VoiceEvent, VoiceEventKind, WorkOutcome,
};

// ============================================================================
// Test Helpers
// ============================================================================

const OPERATOR: UserId = 999;
const EXEMPT_MEMBER: UserId = 500;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Config with deterministic knobs: fixed work reward, 5 minute work
/// window, known enforcement scope and family roles.
fn test_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.work.claim_window_secs = 300;
    config.work.reward_min = 1_000;
    config.work.reward_max = 1_000;
    config.security.operator_id = OPERATOR;
    config.security.exempt_user_ids = vec![EXEMPT_MEMBER];
    config.security.family_role_ids = vec![10, 11];
    config
}

/// Records enforcement actions instead of talking to a chat platform.
struct RecordingSink {
    actions: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            actions: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl EnforcementSink for RecordingSink {
    async fn strip_standing(&self, user_id: UserId) -> Result<(), CoreError> {
        self.actions.lock().await.push(format!("strip:{user_id}"));
        Ok(())
    }

    async fn kick(&self, user_id: UserId) -> Result<(), CoreError> {
        self.actions.lock().await.push(format!("kick:{user_id}"));
        Ok(())
    }

    async fn ban(&self, user_id: UserId) -> Result<(), CoreError> {
        self.actions.lock().await.push(format!("ban:{user_id}"));
        Ok(())
    }
}

/// Sink standing in for a bot whose role sits too low to punish anyone.
struct PowerlessSink;

#[async_trait]
impl EnforcementSink for PowerlessSink {
    async fn strip_standing(&self, _user_id: UserId) -> Result<(), CoreError> {
        Err(CoreError::permission_denied(
            "stripping roles",
            "bot role too low",
        ))
    }

    async fn kick(&self, _user_id: UserId) -> Result<(), CoreError> {
        Err(CoreError::permission_denied("kicking", "bot role too low"))
    }

    async fn ban(&self, _user_id: UserId) -> Result<(), CoreError> {
        Err(CoreError::permission_denied("banning", "bot role too low"))
    }
}

async fn test_core() -> FamilyCore {
    FamilyCore::in_memory(test_config(), RecordingSink::new())
        .await
        .unwrap()
}

fn voice(user_id: UserId, kind: VoiceEventKind, when: DateTime<Utc>) -> VoiceEvent {
    VoiceEvent {
        user_id,
        is_bot: false,
        kind,
        at: when,
    }
}

// ============================================================================
// Voice Session Tracking
// ============================================================================

mod voice_tracking {
    use super::*;

    #[tokio::test]
    async fn test_join_move_leave_accounts_every_second_once() {
        let core = test_core().await;
        let t0 = at(0);
        let t1 = at(600);
        let t2 = at(1500);

        core.voice()
            .handle_event(voice(1, VoiceEventKind::Joined(100), t0))
            .await
            .unwrap();
        core.voice()
            .handle_event(voice(1, VoiceEventKind::Moved { from: 100, to: 200 }, t1))
            .await
            .unwrap();
        core.voice()
            .handle_event(voice(1, VoiceEventKind::Left, t2))
            .await
            .unwrap();

        let activity = core.voice().activity(1, t2).await.unwrap();
        assert_eq!(activity.sessions.len(), 2);

        // Stored intervals are exactly [{c2, t1, t2}, {c1, t0, t1}].
        assert_eq!(activity.sessions[0].channel_id, 200);
        assert_eq!(activity.sessions[0].started_at, t1);
        assert_eq!(activity.sessions[0].ended_at, Some(t2));
        assert_eq!(activity.sessions[1].channel_id, 100);
        assert_eq!(activity.sessions[1].started_at, t0);
        assert_eq!(activity.sessions[1].ended_at, Some(t1));

        // (t1 - t0) + (t2 - t1) with no gaps or overlaps.
        assert_eq!(activity.total_time, t2 - t0);
        assert_eq!(activity.current_channel, None);
    }

    #[tokio::test]
    async fn test_open_session_is_measured_against_query_time() {
        let core = test_core().await;
        core.voice()
            .handle_event(voice(2, VoiceEventKind::Joined(100), at(0)))
            .await
            .unwrap();

        let early = core.voice().activity(2, at(60)).await.unwrap();
        let late = core.voice().activity(2, at(3_600)).await.unwrap();
        assert_eq!(early.total_time, Duration::seconds(60));
        assert_eq!(late.total_time, Duration::seconds(3_600));
        assert_eq!(late.current_channel, Some(100));
    }

    #[tokio::test]
    async fn test_bot_accounts_are_never_tracked() {
        let core = test_core().await;
        core.voice()
            .handle_event(VoiceEvent {
                user_id: 3,
                is_bot: true,
                kind: VoiceEventKind::Joined(100),
                at: at(0),
            })
            .await
            .unwrap();

        let activity = core.voice().activity(3, at(60)).await.unwrap();
        assert!(activity.sessions.is_empty());
        assert_eq!(activity.total_time, Duration::zero());
    }
}

// ============================================================================
// Economy: Balances, Leaderboard, Casino
// ============================================================================

mod economy {
    use super::*;

    #[tokio::test]
    async fn test_first_contact_enrolls_at_default_balance() {
        let core = test_core().await;
        assert_eq!(core.economy().balance(1, at(0)).await.unwrap(), 10_000);

        // The enrollment persisted: the user ranks on the leaderboard.
        let board = core.economy().leaderboard(10).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, 1);
        assert_eq!(board[0].amount, 10_000);
    }

    #[tokio::test]
    async fn test_balance_never_goes_negative() {
        let core = test_core().await;

        assert_eq!(core.economy().set_balance(1, -42, at(0)).await.unwrap(), 0);
        assert_eq!(core.economy().adjust(1, -1_000, at(0)).await.unwrap(), 0);

        core.economy().set_balance(1, 300, at(0)).await.unwrap();
        let err = core.economy().try_debit(1, 301, at(0)).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
        assert_eq!(core.economy().balance(1, at(0)).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_leaderboard_orders_descending_with_stable_ties() {
        let core = test_core().await;
        core.economy().set_balance(1, 500, at(0)).await.unwrap();
        core.economy().set_balance(2, 900, at(1)).await.unwrap();
        core.economy().set_balance(3, 100, at(2)).await.unwrap();

        let top: Vec<UserId> = core
            .economy()
            .leaderboard(2)
            .await
            .unwrap()
            .iter()
            .map(|row| row.user_id)
            .collect();
        assert_eq!(top, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_casino_play_lands_only_on_reachable_balances() {
        let core = test_core().await;
        let mut rng = StdRng::seed_from_u64(2024);

        for round in 0..30 {
            let user = 1_000 + round;
            let outcome = core
                .casino()
                .play(user, Bet::Dice, 1_000, at(0), &mut rng)
                .await
                .unwrap();
            match outcome {
                PlayOutcome::Played(receipt) => {
                    // 10000 - 1000, or that plus 1000 * 2.
                    assert!(
                        receipt.balance_after == 9_000 || receipt.balance_after == 11_000,
                        "unreachable balance {}",
                        receipt.balance_after
                    );
                    assert_eq!(
                        receipt.balance_after,
                        10_000 - receipt.stake + receipt.payout
                    );
                }
                PlayOutcome::Barred => panic!("fresh users are not barred"),
            }
        }
    }

    #[tokio::test]
    async fn test_casino_ban_blocks_play_until_lifted() {
        let core = test_core().await;
        let mut rng = StdRng::seed_from_u64(7);

        core.casino().bar_from_games(1, at(0)).await.unwrap();
        assert!(core.casino().is_barred(1).await.unwrap());

        let outcome = core
            .casino()
            .play(1, Bet::Roulette { pocket: 17 }, 100, at(0), &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Barred);

        assert!(core.casino().readmit_to_games(1).await.unwrap());
        let outcome = core
            .casino()
            .play(1, Bet::Roulette { pocket: 17 }, 100, at(0), &mut rng)
            .await
            .unwrap();
        assert!(matches!(outcome, PlayOutcome::Played(_)));
    }

    #[tokio::test]
    async fn test_invalid_stakes_and_pockets_are_rejected_without_mutation() {
        let core = test_core().await;
        let mut rng = StdRng::seed_from_u64(7);

        let err = core
            .casino()
            .play(1, Bet::Slots, 1, at(0), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = core
            .casino()
            .play(1, Bet::Roulette { pocket: 37 }, 100, at(0), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        // Neither attempt enrolled or charged the user.
        assert_eq!(core.economy().balance(1, at(0)).await.unwrap(), 10_000);
    }
}

// ============================================================================
// Cooldown Gates: Work Claims and Applications
// ============================================================================

mod cooldowns {
    use super::*;

    #[tokio::test]
    async fn test_work_claim_window_blocks_then_reopens() {
        let core = test_core().await;
        let mut rng = StdRng::seed_from_u64(1);

        let first = core.work().claim(1, at(0), &mut rng).await.unwrap();
        assert_eq!(
            first,
            WorkOutcome::Claimed {
                amount: 1_000,
                balance_after: 11_000
            }
        );

        // Four minutes in: blocked, and the stamp must not move.
        let blocked = core.work().claim(1, at(4 * 60), &mut rng).await.unwrap();
        assert_eq!(
            blocked,
            WorkOutcome::OnCooldown {
                retry_at: at(5 * 60)
            }
        );

        // Six minutes in: accepted again.
        let second = core.work().claim(1, at(6 * 60), &mut rng).await.unwrap();
        assert_eq!(
            second,
            WorkOutcome::Claimed {
                amount: 1_000,
                balance_after: 12_000
            }
        );
    }

    #[tokio::test]
    async fn test_application_gate_allows_one_per_window() {
        let core = test_core().await;

        let first = core.recruitment().submit(1, at(0)).await.unwrap();
        let id = match first {
            SubmitOutcome::Accepted { application_id } => application_id,
            SubmitOutcome::OnCooldown { .. } => panic!("first submission is always allowed"),
        };

        let repeat = core.recruitment().submit(1, at(3_600)).await.unwrap();
        assert_eq!(
            repeat,
            SubmitOutcome::OnCooldown {
                retry_at: at(0) + Duration::hours(24)
            }
        );

        // Another user is unaffected.
        let other = core.recruitment().submit(2, at(3_600)).await.unwrap();
        assert!(matches!(other, SubmitOutcome::Accepted { .. }));

        // The decision flow marks the stored row.
        assert!(core.recruitment().decide(id, true).await.unwrap());
        let history = core.recruitment().history(1, 5).await.unwrap();
        assert_eq!(history.len(), 1);
    }
}

// ============================================================================
// Security: Blacklist and Strike Escalation
// ============================================================================

mod security {
    use super::*;

    #[tokio::test]
    async fn test_blacklist_membership_is_idempotent_with_latest_reason() {
        let core = test_core().await;

        let added = core
            .blacklist()
            .add(1, "sold family assets", OPERATOR, at(0))
            .await
            .unwrap();
        assert_eq!(added, BlacklistAdd::NewlyListed);

        let again = core
            .blacklist()
            .add(1, "and lied about it", OPERATOR, at(60))
            .await
            .unwrap();
        assert_eq!(again, BlacklistAdd::ReasonUpdated);

        assert!(core.blacklist().is_blacklisted(1).await.unwrap());
        assert_eq!(
            core.blacklist().reason(1).await.unwrap().as_deref(),
            Some("and lied about it")
        );
        assert_eq!(core.blacklist().entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_family_role_regrant_to_listed_user_raises_alert() {
        let core = test_core().await;
        core.blacklist()
            .add(1, "stole the vault", OPERATOR, at(0))
            .await
            .unwrap();

        let alert = core
            .blacklist()
            .review_role_grant(1, &[10, 77])
            .await
            .unwrap()
            .expect("family role regrant must be flagged");
        assert_eq!(alert.offending_roles, vec![10]);
        assert_eq!(alert.reason, "stole the vault");

        // No alert for unlisted users or non-family roles.
        assert!(core
            .blacklist()
            .review_role_grant(2, &[10])
            .await
            .unwrap()
            .is_none());
        assert!(core
            .blacklist()
            .review_role_grant(1, &[77])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_strikes_escalate_strip_kick_ban() {
        let sink = RecordingSink::new();
        let core = FamilyCore::in_memory(test_config(), sink.clone()).await.unwrap();

        let expectations = [
            (1, StrikeTier::StripStanding),
            (2, StrikeTier::Kick),
            (3, StrikeTier::Ban),
            (4, StrikeTier::Ban),
        ];
        for (expected_count, expected_tier) in expectations {
            let violation = Violation::channel_deleted(1, 4242, at(expected_count));
            match core.strikes().report_violation(&violation).await.unwrap() {
                ViolationOutcome::Struck { count, tier, enforcement } => {
                    assert_eq!(count, expected_count);
                    assert_eq!(tier, expected_tier);
                    assert_eq!(enforcement, Enforcement::Completed);
                }
                ViolationOutcome::Exempt => panic!("user 1 is inside the enforcement scope"),
            }
        }

        let actions = sink.actions.lock().await;
        assert_eq!(*actions, vec!["strip:1", "kick:1", "ban:1", "ban:1"]);
    }

    #[tokio::test]
    async fn test_operator_and_exempt_users_never_collect_strikes() {
        let sink = RecordingSink::new();
        let core = FamilyCore::in_memory(test_config(), sink.clone()).await.unwrap();

        for actor in [OPERATOR, EXEMPT_MEMBER] {
            for _ in 0..4 {
                let violation = Violation::new(actor, ViolationKind::RoleDeleted, at(0));
                assert_eq!(
                    core.strikes().report_violation(&violation).await.unwrap(),
                    ViolationOutcome::Exempt
                );
            }
            assert_eq!(core.strikes().count(actor).await.unwrap(), 0);
        }
        assert!(sink.actions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_refused_enforcement_still_persists_the_strike() {
        let core = FamilyCore::in_memory(test_config(), Arc::new(PowerlessSink))
            .await
            .unwrap();

        let violation = Violation::role_deleted(1, 10, at(0));
        match core.strikes().report_violation(&violation).await.unwrap() {
            ViolationOutcome::Struck { count, enforcement, .. } => {
                assert_eq!(count, 1);
                match enforcement {
                    Enforcement::Failed { reason } => {
                        assert!(reason.contains("bot role too low"));
                    }
                    Enforcement::Completed => panic!("the powerless sink cannot succeed"),
                }
            }
            ViolationOutcome::Exempt => panic!("user 1 is inside the enforcement scope"),
        }

        // The counter moved even though the platform refused the action,
        // and the next violation keeps escalating from there.
        assert_eq!(core.strikes().count(1).await.unwrap(), 1);
        let violation = Violation::role_deleted(1, 11, at(60));
        match core.strikes().report_violation(&violation).await.unwrap() {
            ViolationOutcome::Struck { count, tier, .. } => {
                assert_eq!(count, 2);
                assert_eq!(tier, StrikeTier::Kick);
            }
            ViolationOutcome::Exempt => panic!("user 1 is inside the enforcement scope"),
        }
    }

    #[tokio::test]
    async fn test_pardon_is_the_only_way_down() {
        let core = test_core().await;

        let violation = Violation::new(1, ViolationKind::ChannelEdited, at(0));
        core.strikes().report_violation(&violation).await.unwrap();
        core.strikes().report_violation(&violation).await.unwrap();
        assert_eq!(core.strikes().count(1).await.unwrap(), 2);

        assert!(core.strikes().pardon(1).await.unwrap());
        assert_eq!(core.strikes().count(1).await.unwrap(), 0);

        // After a pardon the ladder restarts from the first tier.
        match core.strikes().report_violation(&violation).await.unwrap() {
            ViolationOutcome::Struck { count, tier, .. } => {
                assert_eq!(count, 1);
                assert_eq!(tier, StrikeTier::StripStanding);
            }
            ViolationOutcome::Exempt => panic!("user 1 is inside the enforcement scope"),
        }
    }
}

// ============================================================================
// Recruitment Profiles and Settings
// ============================================================================

mod membership {
    use super::*;

    #[tokio::test]
    async fn test_profile_flow_enforces_form_limits() {
        let core = test_core().await;

        core.recruitment()
            .save_profile(1, "Don Corleone", "1234567", at(0))
            .await
            .unwrap();
        let profile = core.recruitment().profile(1).await.unwrap().unwrap();
        assert_eq!(profile.nickname, "Don Corleone");

        let err = core
            .recruitment()
            .save_profile(1, &"x".repeat(33), "1", at(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_settings_store_round_trips_and_requires() {
        let core = test_core().await;

        core.settings().put("family_role_id", "424242").await.unwrap();
        assert_eq!(
            core.settings().get("family_role_id").await.unwrap().as_deref(),
            Some("424242")
        );
        assert_eq!(
            core.settings().require("family_role_id").await.unwrap(),
            "424242"
        );

        let err = core.settings().require("missing_key").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        core.settings().put("family_role_id", "777").await.unwrap();
        let all = core.settings().all().await.unwrap();
        assert_eq!(all, vec![("family_role_id".to_string(), "777".to_string())]);
    }
}
