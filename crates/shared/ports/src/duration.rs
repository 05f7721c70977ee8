use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ClockError, ClockResult};

/// A signed interval the engine can shift the fake timeline by
///
/// Numeric durations are seconds (fractional and negative allowed);
/// structured intervals pass through unchanged. Natural-language duration
/// phrases are not supported.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationSpec {
    /// A number of seconds, possibly fractional or negative
    Seconds(f64),
    /// A structured interval
    Interval(Duration),
}

impl DurationSpec {
    /// Resolve the spec to a concrete interval
    pub fn resolve(&self) -> ClockResult<Duration> {
        match self {
            DurationSpec::Seconds(secs) => {
                if !secs.is_finite() {
                    return Err(ClockError::InvalidDuration(format!(
                        "non-finite seconds: {secs}"
                    )));
                }

                let micros = (secs * 1_000_000.0).round();
                if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
                    return Err(ClockError::InvalidDuration(format!(
                        "seconds out of range: {secs}"
                    )));
                }

                Ok(Duration::microseconds(micros as i64))
            }
            DurationSpec::Interval(interval) => Ok(*interval),
        }
    }
}

impl From<f64> for DurationSpec {
    fn from(secs: f64) -> Self {
        DurationSpec::Seconds(secs)
    }
}

impl From<i64> for DurationSpec {
    fn from(secs: i64) -> Self {
        DurationSpec::Seconds(secs as f64)
    }
}

impl From<Duration> for DurationSpec {
    fn from(interval: Duration) -> Self {
        DurationSpec::Interval(interval)
    }
}

/// Serde-friendly mirror of [`DurationSpec`]; structured intervals travel
/// as microsecond counts.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DurationRepr {
    Seconds(f64),
    Micros(i64),
}

impl Serialize for DurationSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            DurationSpec::Seconds(secs) => DurationRepr::Seconds(*secs),
            DurationSpec::Interval(interval) => DurationRepr::Micros(
                interval.num_microseconds().ok_or_else(|| {
                    serde::ser::Error::custom("interval too large for microseconds")
                })?,
            ),
        };

        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DurationSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DurationRepr::deserialize(deserializer)? {
            DurationRepr::Seconds(secs) => DurationSpec::Seconds(secs),
            DurationRepr::Micros(micros) => DurationSpec::Interval(Duration::microseconds(micros)),
        })
    }
}
