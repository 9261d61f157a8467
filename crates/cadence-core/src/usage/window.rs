//! Rolling-window usage meter.
//!
//! The window is plain data owned by the caller: load it, pass it in, persist
//! whatever comes back. Identical inputs always give identical outputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted quota state for one metered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    /// `None` means the count never resets (a hard cap).
    #[serde(default)]
    pub window_length_secs: Option<u64>,
}

impl UsageWindow {
    /// An empty window opening at `now`.
    pub fn new(now: DateTime<Utc>, window_length_secs: Option<u64>) -> Self {
        Self {
            count: 0,
            window_start: now,
            window_length_secs,
        }
    }

    pub fn window_length(&self) -> Option<Duration> {
        let secs = i64::try_from(self.window_length_secs?).ok()?;
        Duration::try_seconds(secs)
    }

    /// True once strictly more than the window length has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.window_length() {
            Some(length) => now.signed_duration_since(self.window_start) > length,
            None => false,
        }
    }

    /// Last instant at which the current window is still in force.
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        self.window_start.checked_add_signed(self.window_length()?)
    }
}

/// Outcome of [`try_increment`]. Running out of quota is `allowed: false`,
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub window: UsageWindow,
}

/// Open a fresh window if the current one has expired, else return it as is.
pub fn check_and_reset(window: &UsageWindow, now: DateTime<Utc>) -> UsageWindow {
    if window.is_expired(now) {
        UsageWindow::new(now, window.window_length_secs)
    } else {
        *window
    }
}

/// Count one metered action if it still fits under `limit`.
///
/// When the action is refused the returned window has not been incremented;
/// it may still differ from the input if the old window had expired.
pub fn try_increment(window: &UsageWindow, limit: u32, now: DateTime<Utc>) -> QuotaDecision {
    let current = check_and_reset(window, now);
    if current.count < limit {
        QuotaDecision {
            allowed: true,
            window: UsageWindow {
                count: current.count + 1,
                ..current
            },
        }
    } else {
        QuotaDecision {
            allowed: false,
            window: current,
        }
    }
}

/// Actions still allowed in the window as it stands at `now`.
pub fn remaining(window: &UsageWindow, limit: u32, now: DateTime<Utc>) -> u32 {
    limit.saturating_sub(check_and_reset(window, now).count)
}

/// Limit and window length for one kind of metered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window_length_secs: Option<u64>,
}

impl QuotaPolicy {
    /// `limit` actions per `hours`-long rolling window.
    pub fn rolling(limit: u32, hours: u64) -> Self {
        Self {
            limit,
            window_length_secs: Some(hours.saturating_mul(3600)),
        }
    }

    /// `limit` actions, ever.
    pub fn hard_cap(limit: u32) -> Self {
        Self {
            limit,
            window_length_secs: None,
        }
    }

    pub fn new_window(&self, now: DateTime<Utc>) -> UsageWindow {
        UsageWindow::new(now, self.window_length_secs)
    }

    /// Re-apply this policy's window length to a stored window, so that a
    /// configuration change takes effect on the next call.
    pub fn adopt(&self, window: &UsageWindow) -> UsageWindow {
        UsageWindow {
            window_length_secs: self.window_length_secs,
            ..*window
        }
    }

    pub fn check(&self, window: &UsageWindow, now: DateTime<Utc>) -> UsageWindow {
        check_and_reset(&self.adopt(window), now)
    }

    pub fn try_increment(&self, window: &UsageWindow, now: DateTime<Utc>) -> QuotaDecision {
        let decision = try_increment(&self.adopt(window), self.limit, now);
        debug!(
            allowed = decision.allowed,
            count = decision.window.count,
            limit = self.limit,
            "quota evaluated"
        );
        decision
    }

    pub fn remaining(&self, window: &UsageWindow, now: DateTime<Utc>) -> u32 {
        remaining(&self.adopt(window), self.limit, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TWELVE_HOURS: u64 = 12 * 3600;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn expired_window_resets_to_now() {
        let window = UsageWindow {
            count: 30,
            window_start: t0(),
            window_length_secs: Some(TWELVE_HOURS),
        };
        let now = t0() + Duration::hours(12) + Duration::seconds(1);
        let fresh = check_and_reset(&window, now);
        assert_eq!(fresh.count, 0);
        assert_eq!(fresh.window_start, now);
        assert_eq!(fresh.window_length_secs, Some(TWELVE_HOURS));
    }

    #[test]
    fn window_is_inclusive_at_exact_length() {
        let window = UsageWindow {
            count: 30,
            window_start: t0(),
            window_length_secs: Some(TWELVE_HOURS),
        };
        let now = t0() + Duration::hours(12);
        assert_eq!(check_and_reset(&window, now), window);
        assert_eq!(window.resets_at(), Some(now));
    }

    #[test]
    fn clock_skew_does_not_reset() {
        let window = UsageWindow {
            count: 5,
            window_start: t0(),
            window_length_secs: Some(60),
        };
        assert_eq!(check_and_reset(&window, t0() - Duration::hours(3)), window);
    }

    #[test]
    fn hard_cap_never_resets() {
        let policy = QuotaPolicy::hard_cap(1000);
        let window = UsageWindow {
            count: 1000,
            ..policy.new_window(t0())
        };
        let much_later = t0() + Duration::days(365);
        let decision = policy.try_increment(&window, much_later);
        assert!(!decision.allowed);
        assert_eq!(decision.window, window);
        assert!(window.resets_at().is_none());
    }

    #[test]
    fn refusal_does_not_increment() {
        let window = UsageWindow {
            count: 2,
            ..UsageWindow::new(t0(), Some(60))
        };
        let decision = try_increment(&window, 2, t0());
        assert!(!decision.allowed);
        assert_eq!(decision.window.count, 2);
    }

    #[test]
    fn increment_after_expiry_starts_new_window() {
        let window = UsageWindow {
            count: 30,
            ..UsageWindow::new(t0(), Some(TWELVE_HOURS))
        };
        let now = t0() + Duration::hours(13);
        let decision = try_increment(&window, 30, now);
        assert!(decision.allowed);
        assert_eq!(decision.window.count, 1);
        assert_eq!(decision.window.window_start, now);
    }

    #[test]
    fn remaining_counts_down() {
        let policy = QuotaPolicy::rolling(3, 12);
        let mut window = policy.new_window(t0());
        assert_eq!(policy.remaining(&window, t0()), 3);
        window = policy.try_increment(&window, t0()).window;
        assert_eq!(policy.remaining(&window, t0()), 2);
    }

    #[test]
    fn policy_change_applies_to_stored_window() {
        let stored = UsageWindow {
            count: 10,
            ..UsageWindow::new(t0(), None)
        };
        let policy = QuotaPolicy::rolling(10, 1);
        let checked = policy.check(&stored, t0() + Duration::hours(2));
        assert_eq!(checked.count, 0);
        assert_eq!(checked.window_length_secs, Some(3600));
    }

    #[test]
    fn zero_limit_always_refuses() {
        let decision = try_increment(&UsageWindow::new(t0(), Some(60)), 0, t0());
        assert!(!decision.allowed);
        assert_eq!(decision.window.count, 0);
    }
}
