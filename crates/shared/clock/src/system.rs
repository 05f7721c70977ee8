use chrono::Utc;
use kronos_core::Timestamp;
use kronos_ports::Clock;

/// Real wall-clock time
///
/// The production now-source: what an empty ambient slot falls back to,
/// made explicit for code that takes a [`Clock`] by injection.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_wall_clock() {
        let clock = SystemClock::new();

        let before = Utc::now();
        let reading = clock.now();
        let after = Utc::now();

        assert!(reading >= before && reading <= after);
    }
}
