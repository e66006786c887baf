//! Mock-mode switch.
//!
//! A single flag telling drivers to fabricate readings instead of touching
//! hardware. It carries no behavior of its own. Tests usually create their
//! own [`MockSwitch`] and hand it to the drivers under test; operational
//! tooling flips the process-wide one through [`set_mock`].

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::info;

/// Shared mock-mode flag. Disabled by default.
#[derive(Debug, Default)]
pub struct MockSwitch {
    enabled: RwLock<bool>,
}

impl MockSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide switch, created on first access.
    pub fn global() -> Arc<MockSwitch> {
        static GLOBAL: OnceLock<Arc<MockSwitch>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(MockSwitch::new())).clone()
    }

    pub fn set(&self, enabled: bool) {
        let mut flag = self.enabled.write();
        if *flag != enabled {
            info!(enabled, "Mock mode changed");
        }
        *flag = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.read()
    }
}

/// Enable or disable mock mode process-wide.
pub fn set_mock(enabled: bool) {
    MockSwitch::global().set(enabled);
}

/// Whether process-wide mock mode is enabled.
pub fn is_mock() -> bool {
    MockSwitch::global().is_enabled()
}
