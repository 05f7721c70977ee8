use chrono::{DateTime, Duration, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Signed microseconds elapsed from `from` to `to`
///
/// Negative when `to` precedes `from`. Saturates at the `i64` range ends
/// for intervals too large to count in microseconds.
pub fn micros_between(from: Timestamp, to: Timestamp) -> i64 {
    (to - from)
        .num_microseconds()
        .unwrap_or(if to >= from { i64::MAX } else { i64::MIN })
}

/// Scale a microsecond count by a factor, rounding half away from zero
///
/// This is the rounding mode used for all fractional-microsecond speed
/// scaling: 0.5 rounds to 1, -0.5 rounds to -1. Results outside the `i64`
/// range saturate.
pub fn scale_micros(micros: i64, factor: f64) -> i64 {
    // f64::round is half-away-from-zero; the `as` cast saturates.
    (micros as f64 * factor).round() as i64
}

/// Add a signed microsecond offset to a timestamp, clamping at the
/// representable `DateTime<Utc>` range instead of overflowing.
pub fn add_micros_saturating(ts: Timestamp, micros: i64) -> Timestamp {
    ts.checked_add_signed(Duration::microseconds(micros))
        .unwrap_or(if micros >= 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}
