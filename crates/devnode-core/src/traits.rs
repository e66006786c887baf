//! Capability traits for device drivers.
//!
//! Drivers hold a [`Device`] and declare the capabilities they support by
//! implementing these traits. The registry stores drivers as
//! `Arc<dyn Component>`; control code asks a component for a capability
//! through [`Component::as_switchable`] / [`Component::as_openable`] instead
//! of downcasting.
//!
//! All traits are object-safe and take `&self`. Drivers keep any mutable
//! hardware state behind their own synchronization.
//!
//! # Examples
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use devnode_core::{Component, Device, Named, Result, Switchable};
//!
//! struct Buzzer {
//!     device: Device,
//!     on: AtomicBool,
//! }
//!
//! impl Named for Buzzer {
//!     fn name(&self) -> &str {
//!         self.device.name()
//!     }
//! }
//!
//! impl Switchable for Buzzer {
//!     fn on(&self) -> Result<()> {
//!         self.on.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     fn off(&self) -> Result<()> {
//!         self.on.store(false, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Buzzer {
//!     fn device(&self) -> &Device {
//!         &self.device
//!     }
//!
//!     fn as_switchable(&self) -> Option<&dyn Switchable> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::Result;
use crate::device::Device;

/// Anything with a stable, human-readable name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Drivers that must acquire and release a bus or pin.
///
/// The framework never calls these itself; driver setup and teardown code
/// does.
pub trait Openable: Send + Sync {
    fn open(&self) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Actuators that can be switched on and off.
pub trait Switchable: Send + Sync {
    fn on(&self) -> Result<()>;

    fn off(&self) -> Result<()>;
}

/// A registrable driver.
pub trait Component: Named + Send + Sync {
    /// The lifecycle entity this driver composes.
    fn device(&self) -> &Device;

    fn as_switchable(&self) -> Option<&dyn Switchable> {
        None
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        None
    }
}

impl Named for Device {
    fn name(&self) -> &str {
        Device::name(self)
    }
}

impl Component for Device {
    fn device(&self) -> &Device {
        self
    }
}
