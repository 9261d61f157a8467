//! Integration tests for the usage meter and ceiling counter.

use cadence_core::usage::{ceiling, check_and_reset, try_increment};
use cadence_core::{CeilingCounter, Database, QuotaPolicy, UsageStore, UsageWindow};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

const WINDOW_SECS: u64 = 12 * 3600;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 21, 30, 0).unwrap()
}

fn window_at(count: u32, start: DateTime<Utc>) -> UsageWindow {
    UsageWindow {
        count,
        window_start: start,
        window_length_secs: Some(WINDOW_SECS),
    }
}

#[test]
fn test_quota_allows_exactly_limit_actions() {
    let mut window = window_at(0, t0());
    for n in 1..=30 {
        let now = t0() + Duration::minutes(n);
        let decision = try_increment(&window, 30, now);
        assert!(decision.allowed, "call {n} should be allowed");
        assert_eq!(decision.window.count, n as u32);
        window = decision.window;
    }

    let decision = try_increment(&window, 30, t0() + Duration::hours(1));
    assert!(!decision.allowed);
    assert_eq!(decision.window.count, 30);
    assert_eq!(decision.window, window);
}

#[test]
fn test_long_idle_caller_gets_fresh_window() {
    let exhausted = window_at(30, t0());
    let next_morning = t0() + Duration::hours(12) + Duration::seconds(1);
    let decision = try_increment(&exhausted, 30, next_morning);
    assert!(decision.allowed);
    assert_eq!(decision.window, window_at(1, next_morning));
}

#[test]
fn test_persisted_quota_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cadence.db");
    let policy = QuotaPolicy::rolling(2, 12);

    {
        let db = Database::open_at(&path).unwrap();
        let mut window = policy.new_window(t0());
        for _ in 0..2 {
            let decision = policy.try_increment(&window, t0());
            assert!(decision.allowed);
            window = decision.window;
        }
        db.save_window("chat-quota", &window).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let window = db.load_window("chat-quota").unwrap().unwrap();
    assert!(!policy.try_increment(&window, t0() + Duration::hours(2)).allowed);
    assert!(policy.try_increment(&window, t0() + Duration::hours(13)).allowed);
}

#[test]
fn test_ceiling_boundary_for_ten_minute_call() {
    let counter = CeilingCounter::new(600).unwrap();
    for elapsed in 0..600 {
        assert!(!counter.advance(elapsed).is_exceeded(), "{elapsed}s");
    }
    for elapsed in [600, 601, 900, 86_400] {
        assert!(counter.advance(elapsed).is_exceeded(), "{elapsed}s");
    }
}

#[test]
fn test_ceiling_advanced_per_tick() {
    let mut call = CeilingCounter::new(600).unwrap();
    let mut ticks = 0;
    while !ceiling::is_exceeded(&call) {
        call = ceiling::advance(&call, 1);
        ticks += 1;
    }
    assert_eq!(ticks, 600);
    assert_eq!(call.remaining_seconds(), 0);
}

proptest! {
    #[test]
    fn prop_expired_window_resets(count in 0u32..10_000, extra in 1i64..10_000_000) {
        let window = window_at(count, t0());
        let now = t0() + Duration::seconds(WINDOW_SECS as i64 + extra);
        let reset = check_and_reset(&window, now);
        prop_assert_eq!(reset, window_at(0, now));
    }

    #[test]
    fn prop_live_window_is_untouched(count in 0u32..10_000, offset in 0i64..=(WINDOW_SECS as i64)) {
        let window = window_at(count, t0());
        let now = t0() + Duration::seconds(offset);
        let checked = check_and_reset(&window, now);
        prop_assert_eq!(checked, window);
        prop_assert_eq!(check_and_reset(&checked, now), checked);
    }

    #[test]
    fn prop_try_increment_is_deterministic(count in 0u32..100, limit in 0u32..100, offset in 0i64..100_000) {
        let window = window_at(count, t0());
        let now = t0() + Duration::seconds(offset);
        prop_assert_eq!(try_increment(&window, limit, now), try_increment(&window, limit, now));
    }

    #[test]
    fn prop_count_never_exceeds_limit(limit in 0u32..50, attempts in 0usize..120) {
        let mut window = window_at(0, t0());
        for _ in 0..attempts {
            window = try_increment(&window, limit, t0()).window;
            prop_assert!(window.count <= limit);
        }
    }

    #[test]
    fn prop_advance_is_associative(
        limit in 1u64..100_000,
        start in 0u64..100_000,
        a in 0u64..100_000,
        b in 0u64..100_000,
    ) {
        let counter = CeilingCounter::new(limit).unwrap().advance(start);
        prop_assert_eq!(counter.advance(a).advance(b), counter.advance(a + b));
    }

    #[test]
    fn prop_exceeded_iff_at_or_past_limit(limit in 1u64..100_000, elapsed in 0u64..200_000) {
        let counter = CeilingCounter::new(limit).unwrap().advance(elapsed);
        prop_assert_eq!(counter.is_exceeded(), elapsed >= limit);
    }
}
