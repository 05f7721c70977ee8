//! Integration test: VirtualClock <-> AmbientClock
//!
//! Tests the full loop: engine operations publish a now-provider into the
//! ambient slot, and every read of "now" through the slot resolves back
//! into the engine's fake timeline.

use chrono::{Duration, TimeZone, Utc};
use kronos_clock::{
    AmbientClock, Directive, MomentSpec, RealTimeOverride, Synchronizer, VirtualClock, apply_all,
};
use kronos_core::Timestamp;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

fn moment(s: &str) -> MomentSpec {
    s.parse().unwrap()
}

fn fmt(ts: Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Engine + ambient pair whose "real" time is 2019-08-01 00:00:00 plus a
/// controllable counter of seconds.
fn mocked_pair() -> (Arc<AmbientClock>, Arc<VirtualClock>, Arc<AtomicI64>) {
    let ambient = Arc::new(AmbientClock::new());
    let clock = VirtualClock::with_ambient(ambient.clone());
    let seconds = Arc::new(AtomicI64::new(0));

    let base = Utc.with_ymd_and_hms(2019, 8, 1, 0, 0, 0).unwrap();
    let counter = seconds.clone();
    clock.mock(Some(RealTimeOverride::dynamic(move |_| {
        base + Duration::seconds(counter.load(Ordering::SeqCst))
    })));

    (ambient, clock, seconds)
}

/// The end-to-end mocked-real-time scenario: release falls back to the
/// mock, freezing pins the ambient reading, unity speed tracks the mocked
/// seconds one for one.
#[test]
fn test_mocked_real_time_scenario() {
    let _ = env_logger::try_init();

    let (ambient, clock, seconds) = mocked_pair();

    // Release publishes the mocked "real" time into the ambient slot
    clock.release().unwrap();
    assert_eq!(fmt(ambient.now()), "2019-08-01 00:00:00");

    clock.set_speed(0.0).unwrap();
    assert_eq!(fmt(ambient.now()), "2019-08-01 00:00:00");

    seconds.fetch_add(3654, Ordering::SeqCst);
    assert_eq!(fmt(ambient.now()), "2019-08-01 00:00:00");

    clock.set_speed(1.0).unwrap();
    seconds.fetch_add(1, Ordering::SeqCst);
    assert_eq!(fmt(ambient.now()), "2019-08-01 00:00:01");
}

/// Scoped mocking restores the outer timeline exactly: anchor, speed, and
/// the provider the ambient slot had before the scope.
#[test]
fn test_scoped_restoration_preserves_outer_timeline() {
    let _ = env_logger::try_init();

    let (ambient, clock, seconds) = mocked_pair();

    clock.set_speed(3.0).unwrap();
    clock.jump_to(moment("2019-08-12"), None).unwrap();

    let inside = clock
        .do_at(moment("2020-05-12"), || {
            // The scope is frozen; jumps inside it stay inside it
            clock.jump_to(moment("2021-01-01"), None).unwrap();
            fmt(ambient.now())
        })
        .unwrap();

    assert_eq!(inside, "2021-01-01 00:00:00");

    // Outer timeline: still anchored at 2019-08-12, advancing at 3x
    assert_eq!(clock.speed(), 3.0);
    seconds.fetch_add(40, Ordering::SeqCst);
    assert_eq!(fmt(ambient.now()), "2019-08-12 00:02:00");
}

/// Nested scopes unwind LIFO; once both exit, no mock remains in the slot.
#[test]
fn test_nested_scopes_release_everything() {
    let _ = env_logger::try_init();

    let ambient = Arc::new(AmbientClock::new());
    let clock = VirtualClock::with_ambient(ambient.clone());

    let inner = clock
        .do_at(moment("2019-08-24"), || {
            let inner = clock
                .do_at(moment("2020-05-12"), || fmt(ambient.now()))
                .unwrap();
            // Back in the outer scope
            assert_eq!(fmt(ambient.now()), "2019-08-24 00:00:00");
            inner
        })
        .unwrap();

    assert_eq!(inner, "2020-05-12 00:00:00");

    // Both scopes exited: real time flows through the slot again
    assert_eq!(clock.speed(), 1.0);
    assert!(ambient.provider().is_none());
    assert!((ambient.now() - Utc::now()).num_seconds().abs() < 1);
}

/// Synchronizers observe every publish in registration order; removal by
/// identity stops further notifications.
#[test]
fn test_synchronizer_ordering_and_removal() {
    let _ = env_logger::try_init();

    let (_, clock, _) = mocked_pair();
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let tags = order.clone();
    let s1: Synchronizer = Arc::new(move |_| {
        tags.lock().push("s1");
        Ok(())
    });
    let tags = order.clone();
    let s2: Synchronizer = Arc::new(move |_| {
        tags.lock().push("s2");
        Ok(())
    });

    clock.add_synchronizer(s1.clone());
    clock.add_synchronizer(s2);

    clock.freeze(moment("2024-01-26"), 0.0).unwrap();
    assert_eq!(*order.lock(), vec!["s1", "s2"]);

    order.lock().clear();
    clock.remove_synchronizer(&s1);
    clock.release().unwrap();
    assert_eq!(*order.lock(), vec!["s2"]);
}

/// A directive plan collected from structured configuration drives the
/// timeline before a test body, with the matching release afterwards.
#[test]
fn test_directive_plan_brackets_a_test_body() {
    let _ = env_logger::try_init();

    let (ambient, clock, _) = mocked_pair();

    let plan: Vec<Directive> = serde_json::from_str(
        r#"[
            {"freeze": {"moment": {"at": "2019-08-24T00:00:00Z"}}},
            {"jump_to": {"moment": {"in_micros": 86400000000}, "speed": 2.0}}
        ]"#,
    )
    .unwrap();

    apply_all(&plan, &clock).unwrap();

    // === Test body ===
    assert_eq!(fmt(ambient.now()), "2019-08-25 00:00:00");
    assert_eq!(clock.speed(), 2.0);

    // === Teardown ===
    Directive::release().apply(&clock).unwrap();
    assert_eq!(clock.speed(), 1.0);
    assert_eq!(fmt(ambient.now()), "2019-08-01 00:00:00");
}
