use kronos_ports::{ClockResult, MomentSpec};
use serde::{Deserialize, Serialize};

use crate::engine::VirtualClock;

/// A declarative test-time instruction
///
/// The closed set of per-test timeline setups a harness can collect for a
/// test identity — from attributes, fixtures, or plain structured
/// configuration — and apply in order before the test body runs (with a
/// matching release afterwards). Each variant maps onto exactly one
/// [`VirtualClock`] operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Freeze the timeline at a moment
    Freeze {
        moment: MomentSpec,
        #[serde(default)]
        speed: f64,
    },
    /// Move the anchor, keeping velocity unless one is given
    JumpTo {
        moment: MomentSpec,
        #[serde(default)]
        speed: Option<f64>,
    },
    /// Change only the rate
    Speed { factor: f64 },
    /// Go back to the present and normal speed
    Release,
}

impl Directive {
    /// Freeze at a moment with time stopped
    pub fn freeze(moment: impl Into<MomentSpec>) -> Self {
        Directive::Freeze {
            moment: moment.into(),
            speed: 0.0,
        }
    }

    /// Jump to a moment, keeping the current speed
    pub fn jump_to(moment: impl Into<MomentSpec>) -> Self {
        Directive::JumpTo {
            moment: moment.into(),
            speed: None,
        }
    }

    /// Set the speed factor
    pub fn speed(factor: f64) -> Self {
        Directive::Speed { factor }
    }

    /// Release the timeline
    pub fn release() -> Self {
        Directive::Release
    }

    /// Apply this directive to a clock
    pub fn apply(&self, clock: &VirtualClock) -> ClockResult<()> {
        match self {
            Directive::Freeze { moment, speed } => clock.freeze(moment.clone(), *speed),
            Directive::JumpTo { moment, speed } => clock.jump_to(moment.clone(), *speed),
            Directive::Speed { factor } => clock.set_speed(*factor).map(|_| ()),
            Directive::Release => clock.release(),
        }
    }
}

/// Apply an ordered directive sequence, stopping at the first failure
pub fn apply_all(directives: &[Directive], clock: &VirtualClock) -> ClockResult<()> {
    for directive in directives {
        directive.apply(clock)?;
    }

    Ok(())
}
