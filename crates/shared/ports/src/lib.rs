//! Kronos Ports
//!
//! Port definitions (traits) for the Kronos time-travel toolkit.
//! These define the boundaries between the virtual-clock engine and the
//! code that consumes or feeds it: the pluggable now-source capability,
//! the installed ambient provider capability, and the moment/duration
//! input specs the engine resolves.

mod clock;
mod duration;
mod error;
mod moment;
mod provider;

pub use clock::Clock;
pub use duration::DurationSpec;
pub use error::{ClockError, ClockResult};
pub use moment::MomentSpec;
pub use provider::NowProvider;
