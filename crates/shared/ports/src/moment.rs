use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use kronos_core::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::Clock;
use crate::error::{ClockError, ClockResult};

/// A moment the engine can re-anchor the fake timeline to
///
/// Covers every accepted target form for freeze/jump operations: the
/// current fake now, an absolute timestamp, a signed offset from the
/// current fake now, or a pluggable clock source queried once at
/// resolution time.
#[derive(Clone)]
pub enum MomentSpec {
    /// The current fake now
    Now,
    /// An absolute timestamp
    At(Timestamp),
    /// A signed offset from the current fake now
    In(Duration),
    /// A pluggable now-source, queried once when the spec is resolved
    Clock(Arc<dyn Clock>),
}

impl MomentSpec {
    /// Resolve the spec to a concrete timestamp relative to the given base
    /// "now" (the current fake now at the call site).
    pub fn resolve(&self, base: Timestamp) -> ClockResult<Timestamp> {
        match self {
            MomentSpec::Now => Ok(base),
            MomentSpec::At(ts) => Ok(*ts),
            MomentSpec::In(offset) => base.checked_add_signed(*offset).ok_or_else(|| {
                ClockError::InvalidMoment(format!("offset {offset} out of range from {base}"))
            }),
            MomentSpec::Clock(clock) => Ok(clock.now()),
        }
    }
}

impl fmt::Debug for MomentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentSpec::Now => write!(f, "Now"),
            MomentSpec::At(ts) => f.debug_tuple("At").field(ts).finish(),
            MomentSpec::In(offset) => f.debug_tuple("In").field(offset).finish(),
            MomentSpec::Clock(clock) => f.debug_tuple("Clock").field(&clock.name()).finish(),
        }
    }
}

impl From<Timestamp> for MomentSpec {
    fn from(ts: Timestamp) -> Self {
        MomentSpec::At(ts)
    }
}

impl From<Duration> for MomentSpec {
    fn from(offset: Duration) -> Self {
        MomentSpec::In(offset)
    }
}

impl From<Arc<dyn Clock>> for MomentSpec {
    fn from(clock: Arc<dyn Clock>) -> Self {
        MomentSpec::Clock(clock)
    }
}

/// Literal-timestamp parsing, delegated to chrono
///
/// Accepted forms: the keyword `now`, RFC 3339, `%Y-%m-%d %H:%M:%S%.f`
/// (read as UTC), and `%Y-%m-%d` (midnight UTC). Natural-language phrases
/// are not supported.
impl FromStr for MomentSpec {
    type Err = ClockError;

    fn from_str(s: &str) -> ClockResult<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("now") {
            return Ok(MomentSpec::Now);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(MomentSpec::At(ts.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(MomentSpec::At(naive.and_utc()));
        }
        if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(MomentSpec::At(naive.and_utc()));
        }

        Err(ClockError::InvalidMoment(format!(
            "unparseable moment literal: {s:?}"
        )))
    }
}

/// Serde-friendly mirror of [`MomentSpec`]; the pluggable-clock variant has
/// no stable representation and refuses to serialize.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MomentRepr {
    Now,
    At(Timestamp),
    InMicros(i64),
}

impl Serialize for MomentSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            MomentSpec::Now => MomentRepr::Now,
            MomentSpec::At(ts) => MomentRepr::At(*ts),
            MomentSpec::In(offset) => MomentRepr::InMicros(
                offset.num_microseconds().ok_or_else(|| {
                    serde::ser::Error::custom("moment offset too large for microseconds")
                })?,
            ),
            MomentSpec::Clock(_) => {
                return Err(serde::ser::Error::custom(
                    "pluggable clock sources cannot be serialized",
                ));
            }
        };

        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MomentSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match MomentRepr::deserialize(deserializer)? {
            MomentRepr::Now => MomentSpec::Now,
            MomentRepr::At(ts) => MomentSpec::At(ts),
            MomentRepr::InMicros(micros) => MomentSpec::In(Duration::microseconds(micros)),
        })
    }
}
