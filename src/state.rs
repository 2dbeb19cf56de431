//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the connection registry shared by every connection task and the
//! liveness monitor, plus the settings those tasks need at runtime.

use crate::config::RelayConfig;
use crate::registry::Registry;

/// Clone is required by Axum; the registry is Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// Bounded length of each peer's outbound queue.
    pub outbound_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self { registry: Registry::new(), outbound_capacity: config.outbound_capacity }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// `AppState` with default settings and an empty registry.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(&RelayConfig::default())
    }

    /// `AppState` whose peers get an outbound queue of `capacity`.
    #[must_use]
    pub fn test_app_state_with_capacity(capacity: usize) -> AppState {
        AppState::new(&RelayConfig { outbound_capacity: capacity, ..RelayConfig::default() })
    }
}
