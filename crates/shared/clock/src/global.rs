//! Process-wide default instance
//!
//! One lazily created ambient slot + engine pair behind free functions,
//! for tests that prefer `kronos_clock::freeze(..)` ergonomics over
//! injecting an explicit [`VirtualClock`]. Shared state: call [`reset`]
//! between test cases, and keep tests touching these functions serial.

use std::sync::Arc;

use kronos_core::Timestamp;
use kronos_ports::{ClockResult, DurationSpec, MomentSpec};
use once_cell::sync::Lazy;

use crate::ambient::AmbientClock;
use crate::engine::{RealTimeOverride, VirtualClock};
use crate::publisher::Synchronizer;

static AMBIENT: Lazy<Arc<AmbientClock>> = Lazy::new(|| Arc::new(AmbientClock::new()));

static DEFAULT: Lazy<Arc<VirtualClock>> =
    Lazy::new(|| VirtualClock::with_ambient(Arc::clone(&AMBIENT)));

/// The process-wide ambient slot
pub fn ambient() -> &'static Arc<AmbientClock> {
    &AMBIENT
}

/// The process-wide engine behind the free functions
pub fn default_clock() -> &'static Arc<VirtualClock> {
    &DEFAULT
}

/// Current time as seen through the process-wide ambient slot
pub fn now() -> Timestamp {
    AMBIENT.now()
}

/// Freeze the timeline to a given moment with time stopped
pub fn freeze(to_moment: impl Into<MomentSpec>) -> ClockResult<()> {
    DEFAULT.freeze(to_moment, 0.0)
}

/// Get the current speed factor
pub fn speed() -> f64 {
    DEFAULT.speed()
}

/// Set the speed factor and return it
pub fn set_speed(new_speed: f64) -> ClockResult<f64> {
    DEFAULT.set_speed(new_speed)
}

/// Speed up the fake timeline by a factor; returns the new speed
pub fn accelerate(factor: f64) -> ClockResult<f64> {
    DEFAULT.accelerate(factor)
}

/// Slow down the fake timeline by a factor; returns the new speed
pub fn decelerate(factor: f64) -> ClockResult<f64> {
    DEFAULT.decelerate(factor)
}

/// Unfreeze the fake timeline
pub fn unfreeze() -> ClockResult<()> {
    DEFAULT.unfreeze()
}

/// Jump to a moment, keeping the current speed unless one is given
pub fn jump_to(moment: impl Into<MomentSpec>, speed: Option<f64>) -> ClockResult<()> {
    DEFAULT.jump_to(moment, speed)
}

/// Advance the fake timeline by a duration
pub fn elapse(duration: impl Into<DurationSpec>, speed: Option<f64>) -> ClockResult<()> {
    DEFAULT.elapse(duration, speed)
}

/// Move the fake timeline back by a duration
pub fn rewind(duration: impl Into<DurationSpec>, speed: Option<f64>) -> ClockResult<()> {
    DEFAULT.rewind(duration, speed)
}

/// Go back to the present and normal speed
pub fn release() -> ClockResult<()> {
    DEFAULT.release()
}

/// Set or clear what the default engine considers "real" system time
pub fn mock(real_now: Option<RealTimeOverride>) {
    DEFAULT.mock(real_now);
}

/// Run an action in a frozen instant, restoring the prior timeline after
pub fn do_at<T>(test_now: impl Into<MomentSpec>, action: impl FnOnce() -> T) -> ClockResult<T> {
    DEFAULT.do_at(test_now, action)
}

/// Run an action in the frozen current instant
pub fn do_now<T>(action: impl FnOnce() -> T) -> ClockResult<T> {
    DEFAULT.do_now(action)
}

/// Clear the mock and release: call between test cases
pub fn reset() -> ClockResult<()> {
    DEFAULT.reset()
}

/// Register a synchronizer on the default engine
pub fn add_synchronizer(synchronizer: Synchronizer) {
    DEFAULT.add_synchronizer(synchronizer);
}

/// Remove a synchronizer from the default engine
pub fn remove_synchronizer(synchronizer: &Synchronizer) {
    DEFAULT.remove_synchronizer(synchronizer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    fn moment(s: &str) -> MomentSpec {
        s.parse().unwrap()
    }

    #[test]
    #[serial(global_clock)]
    fn test_facade_freeze_and_release() {
        reset().unwrap();

        freeze(moment("2019-08-24")).unwrap();
        assert_eq!(now().format("%Y-%m-%d").to_string(), "2019-08-24");
        assert_eq!(speed(), 0.0);

        release().unwrap();
        assert_eq!(speed(), 1.0);
        assert!((now() - Utc::now()).num_seconds().abs() < 1);

        reset().unwrap();
    }

    #[test]
    #[serial(global_clock)]
    fn test_facade_scoped_mocking() {
        reset().unwrap();

        let inside = do_at(moment("2020-05-12"), || {
            now().format("%Y-%m-%d").to_string()
        })
        .unwrap();

        assert_eq!(inside, "2020-05-12");
        assert_eq!(speed(), 1.0);
        assert!((now() - Utc::now()).num_seconds().abs() < 1);

        reset().unwrap();
    }

    #[test]
    #[serial(global_clock)]
    fn test_reset_clears_mock() {
        let pinned = moment("2000-01-01").resolve(Utc::now()).unwrap();
        mock(Some(RealTimeOverride::fixed(pinned)));
        release().unwrap();

        assert_eq!(now(), pinned);

        reset().unwrap();
        assert!((now() - Utc::now()).num_seconds().abs() < 1);
    }
}
