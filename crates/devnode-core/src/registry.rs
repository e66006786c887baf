//! Name-to-device lookup table.
//!
//! The [`DeviceRegistry`] maps device names to shared driver handles. Drivers
//! register themselves after construction; control-message handlers and
//! status reporters look them up by name.
//!
//! Lookups (`get`, `list`, `snapshots`) share a read lock and run
//! concurrently. Mutations (`add`, `remove`, `clear`) take the write lock.
//! No device method that can block is called while the lock is held.
//!
//! The registry does not manage device lifecycles: replacing or removing an
//! entry never stops the periodic loop of the old handle.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use devnode_core::{Device, DeviceRegistry};
//!
//! let registry = DeviceRegistry::new();
//! registry.add(Arc::new(Device::new("relay"))).unwrap();
//!
//! assert!(registry.get("relay").is_some());
//! assert_eq!(registry.list(), vec!["relay".to_string()]);
//!
//! assert!(registry.remove("relay"));
//! assert!(registry.is_empty());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::device::DeviceSnapshot;
use crate::traits::Component;
use crate::{Error, Result};

/// Thread-safe registry of device handles keyed by name.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first access.
    pub fn global() -> Arc<DeviceRegistry> {
        static GLOBAL: OnceLock<Arc<DeviceRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DeviceRegistry::new())).clone()
    }

    /// Register `device` under its name, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDevice`] if the device name is empty. The registry is
    /// left unchanged.
    pub fn add(&self, device: Arc<dyn Component>) -> Result<()> {
        let name = device.name().to_string();
        if name.is_empty() {
            return Err(Error::invalid_device("cannot register a device without a name"));
        }

        let previous = self.devices.write().insert(name.clone(), device);
        if previous.is_some() {
            debug!(device = %name, "Replaced registered device");
        } else {
            debug!(device = %name, "Registered device");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.devices.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.read().contains_key(name)
    }

    /// Remove the entry for `name`. Returns whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.devices.write().remove(name).is_some();
        if removed {
            debug!(device = %name, "Removed device");
        }
        removed
    }

    /// Names of all registered devices, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Status snapshots of all registered devices, sorted by name.
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        // Clone the handles first so device locks are not taken under ours.
        let handles: Vec<Arc<dyn Component>> = self.devices.read().values().cloned().collect();

        let mut snapshots: Vec<DeviceSnapshot> =
            handles.iter().map(|d| d.device().snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.devices.write().clear();
        debug!("Cleared device registry");
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.list())
            .finish()
    }
}
