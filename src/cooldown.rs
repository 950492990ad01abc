use chrono::{DateTime, Duration, Utc};

/// Decision of a cooldown gate.
///
/// Gates only decide; they never touch storage. Callers persist state on
/// `Ready` outcomes and render `Blocked` back to the user, so a denied
/// attempt leaves no trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// The action may proceed
    Ready,
    /// The action is rate-limited until `retry_at`
    Blocked { retry_at: DateTime<Utc> },
}

impl CooldownStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CooldownStatus::Ready)
    }

    pub fn retry_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CooldownStatus::Ready => None,
            CooldownStatus::Blocked { retry_at } => Some(*retry_at),
        }
    }
}

/// Fixed-window gate: one action per `window`, measured from the last
/// accepted action. A user with no recorded action is always `Ready`.
pub fn since_last(
    last_action: Option<DateTime<Utc>>,
    window: Duration,
    now: DateTime<Utc>,
) -> CooldownStatus {
    match last_action {
        None => CooldownStatus::Ready,
        Some(last) => {
            let retry_at = last + window;
            if now >= retry_at {
                CooldownStatus::Ready
            } else {
                CooldownStatus::Blocked { retry_at }
            }
        }
    }
}

/// Budget gate over an action log: at most `budget` logged actions inside
/// the window ending now. `newest_in_window` is the most recent logged
/// action; the retry bound is measured from it, which is exact for a
/// budget of one and conservative otherwise.
pub fn within_budget(
    count_in_window: i64,
    budget: i64,
    newest_in_window: Option<DateTime<Utc>>,
    window: Duration,
) -> CooldownStatus {
    if count_in_window < budget {
        return CooldownStatus::Ready;
    }
    match newest_in_window {
        Some(newest) => CooldownStatus::Blocked {
            retry_at: newest + window,
        },
        // Counted rows but no timestamp to anchor on; stay permissive
        // rather than block forever.
        None => CooldownStatus::Ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_action_is_always_ready() {
        assert!(since_last(None, Duration::minutes(5), at(0)).is_ready());
    }

    #[test]
    fn test_blocks_inside_window_and_reports_retry_time() {
        let window = Duration::minutes(5);
        let status = since_last(Some(at(0)), window, at(4 * 60));
        assert_eq!(
            status,
            CooldownStatus::Blocked {
                retry_at: at(5 * 60)
            }
        );
    }

    #[test]
    fn test_reopens_once_window_elapsed() {
        let window = Duration::minutes(5);
        assert!(since_last(Some(at(0)), window, at(6 * 60)).is_ready());
        // Boundary: exactly at expiry counts as ready.
        assert!(since_last(Some(at(0)), window, at(5 * 60)).is_ready());
    }

    #[test]
    fn test_budget_gate_opens_below_budget() {
        let status = within_budget(0, 1, None, Duration::hours(24));
        assert!(status.is_ready());
    }

    #[test]
    fn test_budget_gate_blocks_at_budget() {
        let window = Duration::hours(24);
        let status = within_budget(1, 1, Some(at(0)), window);
        assert_eq!(
            status,
            CooldownStatus::Blocked {
                retry_at: at(0) + window
            }
        );
    }
}
