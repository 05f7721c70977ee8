use std::sync::Arc;

use chrono::Utc;
use kronos_core::Timestamp;
use kronos_ports::{Clock, NowProvider};
use parking_lot::RwLock;

/// The ambient now-source slot
///
/// The one globally reachable mutable binding downstream code reads
/// "current time" from. Empty means real time passes through; otherwise
/// every read routes the true system reading through the installed
/// provider. Code under test takes this (or any other [`Clock`]) by
/// injection; a process-wide instance backs the crate-level free functions.
pub struct AmbientClock {
    provider: RwLock<Option<Arc<dyn NowProvider>>>,
}

impl AmbientClock {
    /// Create an empty slot (real-time passthrough)
    pub fn new() -> Self {
        Self {
            provider: RwLock::new(None),
        }
    }

    /// Install a provider, or clear the slot with `None`
    pub fn install(&self, provider: Option<Arc<dyn NowProvider>>) {
        *self.provider.write() = provider;
    }

    /// Snapshot of the currently installed provider
    pub fn provider(&self) -> Option<Arc<dyn NowProvider>> {
        self.provider.read().clone()
    }

    /// Current time as seen through the slot
    pub fn now(&self) -> Timestamp {
        // Clone the provider out so no lock is held across the call.
        let provider = self.provider.read().clone();
        let real = Utc::now();

        match provider {
            Some(provider) => provider.now_from(real),
            None => real,
        }
    }
}

impl Default for AmbientClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for AmbientClock {
    fn now(&self) -> Timestamp {
        AmbientClock::now(self)
    }

    fn name(&self) -> &str {
        "AmbientClock"
    }
}
