use std::fmt;
use std::sync::{Arc, Weak};

use chrono::Utc;
use kronos_core::{Timestamp, add_micros_saturating, micros_between, scale_micros};
use kronos_ports::{Clock, ClockError, ClockResult, DurationSpec, MomentSpec, NowProvider};
use log::debug;
use parking_lot::Mutex;

use crate::ambient::AmbientClock;
use crate::publisher::{ClockPublisher, Synchronizer};

/// What the engine treats as "real" system time
///
/// A meta-testing hook: substitutes the reading the engine takes from the
/// system clock, independent of freeze/speed state, so the engine's own
/// timing arithmetic can be driven deterministically.
#[derive(Clone)]
pub enum RealTimeOverride {
    /// A pinned real moment
    Fixed(Timestamp),
    /// A function of the true system time
    Dynamic(Arc<dyn Fn(Timestamp) -> Timestamp + Send + Sync>),
}

impl RealTimeOverride {
    /// Pin "real" time to a constant moment
    pub fn fixed(moment: Timestamp) -> Self {
        RealTimeOverride::Fixed(moment)
    }

    /// Derive "real" time from the true system reading
    pub fn dynamic(f: impl Fn(Timestamp) -> Timestamp + Send + Sync + 'static) -> Self {
        RealTimeOverride::Dynamic(Arc::new(f))
    }

    fn observe(&self, true_now: Timestamp) -> Timestamp {
        match self {
            RealTimeOverride::Fixed(moment) => *moment,
            RealTimeOverride::Dynamic(f) => f(true_now),
        }
    }
}

impl fmt::Debug for RealTimeOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealTimeOverride::Fixed(moment) => f.debug_tuple("Fixed").field(moment).finish(),
            RealTimeOverride::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// The fake-timeline state
///
/// `reference_moment` and `last_sync_at` are set together and cleared
/// together: the anchor is meaningless without the real reading it was
/// taken at.
#[derive(Clone)]
struct TimelineState {
    reference_moment: Option<Timestamp>,
    last_sync_at: Option<Timestamp>,
    speed: f64,
    real_time_override: Option<RealTimeOverride>,
}

impl TimelineState {
    fn at_rest() -> Self {
        Self {
            reference_moment: None,
            last_sync_at: None,
            speed: 1.0,
            real_time_override: None,
        }
    }

    /// Apply the real-time override to a true system reading
    fn observed_real(&self, true_now: Timestamp) -> Timestamp {
        match &self.real_time_override {
            Some(mock) => mock.observe(true_now),
            None => true_now,
        }
    }

    /// Fake now for a given (already overridden) real reading
    ///
    /// Unanchored timelines pass real time through. Frozen timelines
    /// return the anchor unchanged. Otherwise the anchor advances by the
    /// signed real elapsed microseconds scaled by the speed factor,
    /// rounded half away from zero, saturating at the timestamp range
    /// ends.
    fn fake_at(&self, real: Timestamp) -> Timestamp {
        let (Some(reference), Some(last_sync)) = (self.reference_moment, self.last_sync_at) else {
            return real;
        };

        if self.speed == 0.0 {
            return reference;
        }

        let elapsed = micros_between(last_sync, real);
        add_micros_saturating(reference, scale_micros(elapsed, self.speed))
    }
}

/// The virtual-clock engine
///
/// Derives a fake "current moment" from a real clock reading, a speed
/// factor, and a pinned reference moment. Every state transition goes
/// through [`VirtualClock::freeze`]; every transition republishes the
/// now-provider through the [`ClockPublisher`] and fires the registered
/// synchronizers.
///
/// The engine is synchronous and re-entrant: no lock is ever held across
/// a synchronizer, a dynamic override, or a scoped action, so callbacks
/// may freely read and mutate the clock they were triggered by.
pub struct VirtualClock {
    state: Mutex<TimelineState>,
    publisher: ClockPublisher,
    weak_self: Weak<VirtualClock>,
}

impl VirtualClock {
    /// Create an engine with no ambient slot (publishes go nowhere)
    pub fn new() -> Arc<Self> {
        Self::build(ClockPublisher::detached())
    }

    /// Create an engine bound to an ambient slot
    pub fn with_ambient(slot: Arc<AmbientClock>) -> Arc<Self> {
        Self::build(ClockPublisher::new(slot))
    }

    fn build(publisher: ClockPublisher) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            state: Mutex::new(TimelineState::at_rest()),
            publisher,
            weak_self: weak_self.clone(),
        })
    }

    /// Get the publishing seam
    pub fn publisher(&self) -> &ClockPublisher {
        &self.publisher
    }

    fn snapshot(&self) -> TimelineState {
        self.state.lock().clone()
    }

    fn fake_provider(&self) -> Arc<dyn NowProvider> {
        Arc::new(EngineNowProvider {
            engine: self.weak_self.clone(),
        })
    }

    /// Current fake now
    ///
    /// Real (possibly overridden) time passes through while the timeline
    /// is unanchored; reading it never mutates engine state.
    pub fn now(&self) -> Timestamp {
        let state = self.snapshot();
        let observed = state.observed_real(Utc::now());
        state.fake_at(observed)
    }

    /// Compute the fake now for a given real-time reading
    ///
    /// On the first read of a fresh engine the timeline is lazily anchored
    /// at the given reading with unity speed, so real time passes through
    /// until something freezes or jumps.
    pub fn fake(&self, real: Timestamp) -> Timestamp {
        let mut state = self.state.lock();

        if state.reference_moment.is_none() {
            state.reference_moment = Some(real);
            state.last_sync_at = Some(real);
            state.speed = 1.0;
        }

        state.fake_at(real)
    }

    /// Freeze the timeline to a given moment at a given speed
    ///
    /// The single state-transition primitive: every other mutating
    /// operation delegates here. The target moment resolves against the
    /// current fake now (before re-anchoring); the sync point is the real
    /// clock read through the override; then a fresh provider is published
    /// and synchronizers fire.
    pub fn freeze(&self, to_moment: impl Into<MomentSpec>, speed: f64) -> ClockResult<()> {
        if !speed.is_finite() {
            return Err(ClockError::InvalidSpeed(speed));
        }

        let to_moment = to_moment.into();
        let before = self.snapshot();
        let observed = before.observed_real(Utc::now());
        let resolved = to_moment.resolve(before.fake_at(observed))?;

        {
            let mut state = self.state.lock();
            state.reference_moment = Some(resolved);
            state.last_sync_at = Some(observed);
            state.speed = speed;
        }

        debug!("freeze: anchored at {resolved}, speed {speed}");

        self.publisher.publish(Some(self.fake_provider()))
    }

    /// Get the current speed factor
    ///
    /// 0 = frozen, 1 = real-life speed, 2 = twice as fast, negative =
    /// time runs backward.
    pub fn speed(&self) -> f64 {
        self.state.lock().speed
    }

    /// Set the speed factor, re-anchoring at the current fake now, and
    /// return the new speed.
    pub fn set_speed(&self, speed: f64) -> ClockResult<f64> {
        self.freeze(MomentSpec::Now, speed)?;
        Ok(speed)
    }

    /// Speed up the fake timeline by a factor; returns the new speed
    pub fn accelerate(&self, factor: f64) -> ClockResult<f64> {
        self.set_speed(self.speed() * factor)
    }

    /// Slow down the fake timeline by a factor; returns the new speed
    pub fn decelerate(&self, factor: f64) -> ClockResult<f64> {
        self.set_speed(self.speed() / factor)
    }

    /// Unfreeze the timeline, resuming at real-life speed
    ///
    /// Fails with [`ClockError::UnfrozenTime`] when time is not frozen.
    pub fn unfreeze(&self) -> ClockResult<()> {
        if self.speed() != 0.0 {
            return Err(ClockError::UnfrozenTime);
        }

        self.set_speed(1.0)?;
        Ok(())
    }

    /// Jump to a moment, keeping the current speed unless one is given
    pub fn jump_to(&self, moment: impl Into<MomentSpec>, speed: Option<f64>) -> ClockResult<()> {
        let speed = speed.unwrap_or_else(|| self.speed());
        self.freeze(moment, speed)
    }

    /// Advance the fake timeline by a duration
    ///
    /// Numeric durations are seconds. Keeps the current speed unless one
    /// is given.
    pub fn elapse(&self, duration: impl Into<DurationSpec>, speed: Option<f64>) -> ClockResult<()> {
        self.shift(duration.into(), true, speed)
    }

    /// Move the fake timeline back by a duration
    ///
    /// Numeric durations are seconds. Keeps the current speed unless one
    /// is given.
    pub fn rewind(&self, duration: impl Into<DurationSpec>, speed: Option<f64>) -> ClockResult<()> {
        self.shift(duration.into(), false, speed)
    }

    fn shift(&self, duration: DurationSpec, forward: bool, speed: Option<f64>) -> ClockResult<()> {
        let interval = duration.resolve()?;
        let base = self.now();
        let target = if forward {
            base.checked_add_signed(interval)
        } else {
            base.checked_sub_signed(interval)
        }
        .ok_or_else(|| {
            ClockError::InvalidMoment(format!("shift by {interval} out of range from {base}"))
        })?;

        self.jump_to(MomentSpec::At(target), speed)
    }

    /// Go back to the present and normal speed
    ///
    /// Clears the anchor and republishes: the real-time override if one is
    /// set (captured by value — later [`VirtualClock::mock`] calls do not
    /// retroactively change a released provider), otherwise the slot is
    /// cleared to real-time passthrough.
    pub fn release(&self) -> ClockResult<()> {
        let mock = {
            let mut state = self.state.lock();
            state.reference_moment = None;
            state.last_sync_at = None;
            state.speed = 1.0;
            state.real_time_override.clone()
        };

        debug!(
            "release: back to {} time",
            if mock.is_some() { "mocked real" } else { "real" }
        );

        match mock {
            Some(mock) => self.publisher.publish(Some(Arc::new(ReleasedNowProvider { mock }))),
            None => self.publisher.publish(None),
        }
    }

    /// Set or clear what this engine considers "real" system time
    ///
    /// Takes effect immediately for an installed fake-time provider (the
    /// provider consults the override on every read); no provider change
    /// is published and synchronizers do not fire.
    pub fn mock(&self, real_now: Option<RealTimeOverride>) {
        self.state.lock().real_time_override = real_now;
    }

    /// Run an action in a frozen instant, restoring the prior timeline on
    /// every exit path
    ///
    /// Snapshots the full engine state plus the installed provider, calls
    /// `freeze(test_now, 0)`, runs the action, and restores everything —
    /// also when the action panics or the inner freeze fails. The prior
    /// provider is reinstalled without a synchronizer round. Nesting is
    /// supported; scopes restore LIFO.
    pub fn do_at<T>(
        &self,
        test_now: impl Into<MomentSpec>,
        action: impl FnOnce() -> T,
    ) -> ClockResult<T> {
        let guard = RestoreGuard {
            clock: self,
            snapshot: self.snapshot(),
            prior_provider: self.publisher.installed(),
        };

        self.freeze(test_now, 0.0)?;
        let value = action();
        drop(guard);

        Ok(value)
    }

    /// Run an action in the frozen current instant; see [`VirtualClock::do_at`]
    pub fn do_now<T>(&self, action: impl FnOnce() -> T) -> ClockResult<T> {
        self.do_at(MomentSpec::Now, action)
    }

    /// Register a synchronizer; fired on every publish, in order
    pub fn add_synchronizer(&self, synchronizer: Synchronizer) {
        self.publisher.add_synchronizer(synchronizer);
    }

    /// Remove a synchronizer registered with `add_synchronizer`
    pub fn remove_synchronizer(&self, synchronizer: &Synchronizer) {
        self.publisher.remove_synchronizer(synchronizer);
    }

    /// Clear the mock and release: the between-tests isolation hook
    pub fn reset(&self) -> ClockResult<()> {
        self.mock(None);
        self.release()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        VirtualClock::now(self)
    }

    fn name(&self) -> &str {
        "VirtualClock"
    }
}

/// The provider a freeze installs: routes the ambient reading through the
/// engine's override, then through the fake-timeline arithmetic.
struct EngineNowProvider {
    engine: Weak<VirtualClock>,
}

impl NowProvider for EngineNowProvider {
    fn now_from(&self, real: Timestamp) -> Timestamp {
        match self.engine.upgrade() {
            Some(engine) => {
                let observed = engine.snapshot().observed_real(real);
                engine.fake(observed)
            }
            // Engine dropped out from under the slot: pass real time through
            None => real,
        }
    }
}

/// The provider a release installs while a real-time override is set
struct ReleasedNowProvider {
    mock: RealTimeOverride,
}

impl NowProvider for ReleasedNowProvider {
    fn now_from(&self, real: Timestamp) -> Timestamp {
        self.mock.observe(real)
    }
}

/// Unconditional state restoration for scoped mocking
struct RestoreGuard<'a> {
    clock: &'a VirtualClock,
    snapshot: TimelineState,
    prior_provider: Option<Arc<dyn NowProvider>>,
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        *self.clock.state.lock() = self.snapshot.clone();
        self.clock.publisher.restore(self.prior_provider.take());
    }
}
