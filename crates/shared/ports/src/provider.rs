use kronos_core::Timestamp;

/// Port for the installed ambient now-source
///
/// Whatever the publisher installs into the ambient slot implements this:
/// given the real clock reading taken by the slot, produce the time the
/// rest of the program should see. Keeping this a named capability (rather
/// than a bare closure) keeps ownership of the engine reference explicit.
pub trait NowProvider: Send + Sync {
    /// Derive the published "now" from a real clock reading
    fn now_from(&self, real: Timestamp) -> Timestamp;
}
