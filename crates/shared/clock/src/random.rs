use chrono::Utc;
use kronos_core::{Timestamp, add_micros_saturating, micros_between};
use kronos_ports::{Clock, ClockError, ClockResult, MomentSpec};
use rand::Rng;

/// Clock that returns a random moment between two bounds on every read
///
/// Useful as a freeze/jump target to shake date-dependent assumptions out
/// of a test: each `now()` call draws a fresh uniform timestamp from the
/// inclusive range.
pub struct RandomClock {
    min: Timestamp,
    span_micros: i64,
}

impl RandomClock {
    /// Create a clock drawing from `[min, max]`, both bounds resolved
    /// against the real current time.
    pub fn between(min: impl Into<MomentSpec>, max: impl Into<MomentSpec>) -> ClockResult<Self> {
        let now = Utc::now();
        let min = min.into().resolve(now)?;
        let max = max.into().resolve(now)?;
        let span_micros = micros_between(min, max);

        if span_micros < 0 {
            return Err(ClockError::InvalidMoment(format!(
                "random range is inverted: {min} is after {max}"
            )));
        }

        Ok(Self { min, span_micros })
    }
}

impl Clock for RandomClock {
    fn now(&self) -> Timestamp {
        let micros = rand::thread_rng().gen_range(0..=self.span_micros);
        add_micros_saturating(self.min, micros)
    }

    fn name(&self) -> &str {
        "RandomClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bounds() -> (Timestamp, Timestamp) {
        let min = Utc.with_ymd_and_hms(2019, 8, 1, 0, 0, 0).unwrap();
        (min, min + Duration::hours(1))
    }

    #[test]
    fn test_draws_stay_within_bounds() {
        let (min, max) = bounds();
        let clock = RandomClock::between(min, max).unwrap();

        for _ in 0..100 {
            let drawn = clock.now();
            assert!(drawn >= min && drawn <= max);
        }
    }

    #[test]
    fn test_degenerate_range_is_constant() {
        let (min, _) = bounds();
        let clock = RandomClock::between(min, min).unwrap();

        assert_eq!(clock.now(), min);
        assert_eq!(clock.now(), min);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let (min, max) = bounds();

        assert!(matches!(
            RandomClock::between(max, min),
            Err(ClockError::InvalidMoment(_))
        ));
    }

    #[test]
    fn test_relative_bounds_resolve_against_real_now() {
        let clock =
            RandomClock::between(Duration::days(-1), MomentSpec::Now).unwrap();

        let drawn = clock.now();
        let now = Utc::now();
        assert!(drawn >= now - Duration::days(1) - Duration::seconds(5));
        assert!(drawn <= now + Duration::seconds(5));
    }
}
