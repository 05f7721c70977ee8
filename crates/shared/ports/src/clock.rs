use kronos_core::Timestamp;

/// Port for time abstraction
///
/// This allows code under test to read "now" from different sources:
/// - Real system time for production
/// - The virtual clock's fake timeline for tests
/// - Pluggable sources (fixed, random) used as freeze/jump targets
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
