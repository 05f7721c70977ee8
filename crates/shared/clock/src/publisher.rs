use std::sync::Arc;

use kronos_ports::{ClockResult, NowProvider};
use log::trace;
use parking_lot::Mutex;

use crate::ambient::AmbientClock;

/// Callback notified with the new provider on every publish
pub type Synchronizer =
    Arc<dyn Fn(Option<&Arc<dyn NowProvider>>) -> ClockResult<()> + Send + Sync>;

/// The bridge between the virtual-clock engine and the ambient slot
///
/// Owns the slot reference and the ordered synchronizer list. A publisher
/// may be detached (no slot); installs then become no-ops while
/// synchronizers still fire, which is how an engine is unit-tested without
/// touching any ambient state.
pub struct ClockPublisher {
    slot: Option<Arc<AmbientClock>>,
    synchronizers: Mutex<Vec<Synchronizer>>,
}

impl ClockPublisher {
    /// Create a publisher bound to an ambient slot
    pub fn new(slot: Arc<AmbientClock>) -> Self {
        Self {
            slot: Some(slot),
            synchronizers: Mutex::new(Vec::new()),
        }
    }

    /// Create a publisher with no ambient slot
    pub fn detached() -> Self {
        Self {
            slot: None,
            synchronizers: Mutex::new(Vec::new()),
        }
    }

    /// Get the bound ambient slot, if any
    pub fn slot(&self) -> Option<&Arc<AmbientClock>> {
        self.slot.as_ref()
    }

    /// Install a provider and notify every synchronizer, in registration
    /// order, synchronously.
    ///
    /// The first synchronizer failure propagates and aborts the remaining
    /// notifications; the slot keeps the already-installed provider (no
    /// rollback).
    pub fn publish(&self, provider: Option<Arc<dyn NowProvider>>) -> ClockResult<()> {
        if let Some(slot) = &self.slot {
            slot.install(provider.clone());
        }

        trace!(
            "publish: {} provider installed",
            if provider.is_some() { "fake-time" } else { "no" }
        );

        // Clone the list out so synchronizers can re-enter the publisher.
        let synchronizers = self.synchronizers.lock().clone();
        for synchronizer in &synchronizers {
            synchronizer(provider.as_ref())?;
        }

        Ok(())
    }

    /// Install a provider without notifying synchronizers
    ///
    /// This is the scoped-mocking restore path: the prior provider comes
    /// back exactly as snapshotted and observers are not re-notified.
    pub fn restore(&self, provider: Option<Arc<dyn NowProvider>>) {
        if let Some(slot) = &self.slot {
            slot.install(provider);
        }
    }

    /// Snapshot of the provider currently installed in the slot
    pub fn installed(&self) -> Option<Arc<dyn NowProvider>> {
        self.slot.as_ref().and_then(|slot| slot.provider())
    }

    /// Append a synchronizer; duplicates are kept
    pub fn add_synchronizer(&self, synchronizer: Synchronizer) {
        self.synchronizers.lock().push(synchronizer);
    }

    /// Remove every registration of this synchronizer, matched by identity
    pub fn remove_synchronizer(&self, synchronizer: &Synchronizer) {
        self.synchronizers
            .lock()
            .retain(|registered| !Arc::ptr_eq(registered, synchronizer));
    }
}
