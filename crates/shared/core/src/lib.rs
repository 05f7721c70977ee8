//! Kronos Core
//!
//! Pure time values and microsecond arithmetic for the Kronos time-travel
//! toolkit. This crate contains no I/O, no locking, and is 100% unit
//! testable.

mod time;

pub use time::{Timestamp, add_micros_saturating, micros_between, scale_micros};
