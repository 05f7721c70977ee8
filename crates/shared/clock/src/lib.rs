//! Kronos Clock
//!
//! Virtual-clock engine for deterministic time in tests: freeze, jump, or
//! scale the flow of "now", then restore real time afterward.
//!
//! ## Component Layout
//!
//! ```text
//! VirtualClock (fake-timeline state + arithmetic)
//!     │
//!     └── ClockPublisher (installs the now-provider, fires synchronizers)
//!             │
//!             └── AmbientClock (the slot downstream code reads "now" from)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use kronos_clock::{AmbientClock, VirtualClock};
//! use kronos_ports::MomentSpec;
//! use std::sync::Arc;
//!
//! // Explicit engine bound to an ambient slot injected into code under test
//! let ambient = Arc::new(AmbientClock::new());
//! let clock = VirtualClock::with_ambient(ambient.clone());
//!
//! clock.freeze("2019-08-24".parse::<MomentSpec>()?, 0.0)?; // pin "now"
//! clock.set_speed(5.0)?;                                   // 5x fast-forward
//! clock.elapse(3, None)?;                                  // 3 seconds later
//! clock.release()?;                                        // back to real time
//!
//! // Or lean on the process-wide default instance
//! kronos_clock::freeze(MomentSpec::Now)?;
//! let pinned = kronos_clock::now();
//! kronos_clock::reset()?;
//! ```

mod ambient;
mod directive;
mod engine;
mod global;
mod publisher;
mod random;
mod system;

pub use ambient::AmbientClock;
pub use directive::{Directive, apply_all};
pub use engine::{RealTimeOverride, VirtualClock};
pub use global::{
    accelerate, add_synchronizer, ambient, decelerate, default_clock, do_at, do_now, elapse,
    freeze, jump_to, mock, now, release, remove_synchronizer, reset, rewind, set_speed, speed,
    unfreeze,
};
pub use publisher::{ClockPublisher, Synchronizer};
pub use random::RandomClock;
pub use system::SystemClock;

// Re-export the boundary contracts for convenience
pub use kronos_ports::{Clock, ClockError, ClockResult, DurationSpec, MomentSpec, NowProvider};
