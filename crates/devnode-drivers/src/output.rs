//! Digital output driver for LEDs and relays.
//!
//! A [`DigitalOutput`] holds a [`Device`] and a [`DigitalPin`]. It can be
//! switched through the [`Switchable`] capability or by control messages
//! (`on`, `off`, `1`, `0`), and reports its level on each periodic tick.
//!
//! In mock mode the pin is never touched; the driver only tracks the level
//! it would have driven.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use devnode_core::{MockSwitch, Openable, Switchable};
//! use devnode_drivers::mock::MockPin;
//! use devnode_drivers::output::{DigitalOutput, OutputKind};
//! use devnode_drivers::publish::ChannelPublisher;
//!
//! let (publisher, _rx) = ChannelPublisher::new(8);
//! let pin = MockPin::new(6);
//! let led = DigitalOutput::new(
//!     "led",
//!     OutputKind::Led,
//!     pin.clone(),
//!     Arc::new(publisher),
//!     "station/led/data",
//!     Arc::new(MockSwitch::new()),
//! );
//!
//! led.open().unwrap();
//! led.handle_command("ON").unwrap();
//! assert!(led.is_on());
//! assert!(pin.is_high());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use devnode_core::{
    Component, Device, DeviceState, MockSwitch, Named, Openable, Result, Switchable,
};
use tracing::{debug, info};

use crate::control::SwitchCommand;
use crate::hardware::DigitalPin;
use crate::publish::Publisher;

/// What the output line is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Led,
    Relay,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Led => write!(f, "LED"),
            Self::Relay => write!(f, "Relay"),
        }
    }
}

/// LED or relay on a single GPIO line.
pub struct DigitalOutput<P> {
    device: Device,
    kind: OutputKind,
    pin: P,
    level: AtomicBool,
    publisher: Arc<dyn Publisher>,
    topic: String,
    mock: Arc<MockSwitch>,
}

impl<P: DigitalPin> DigitalOutput<P> {
    pub fn new(
        name: impl Into<String>,
        kind: OutputKind,
        pin: P,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
        mock: Arc<MockSwitch>,
    ) -> Self {
        Self {
            device: Device::new(name),
            kind,
            pin,
            level: AtomicBool::new(false),
            publisher,
            topic: topic.into(),
            mock,
        }
    }

    /// Level last driven (or simulated, in mock mode).
    pub fn is_on(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Apply a textual control message.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidData`](devnode_core::Error::InvalidData) for an
    /// unrecognized payload, or the pin error if the line cannot be driven.
    pub fn handle_command(&self, payload: &str) -> Result<()> {
        match payload.parse::<SwitchCommand>()? {
            SwitchCommand::On => self.on(),
            SwitchCommand::Off => self.off(),
        }
    }

    /// Publish the current level as `on`/`off`.
    ///
    /// This is the read-and-publish callback of an output.
    pub fn publish_state(&self) -> Result<()> {
        let payload = if self.is_on() { "on" } else { "off" };
        self.publisher.publish(&self.topic, payload.as_bytes().to_vec())
    }

    fn drive(&self, high: bool) -> Result<()> {
        if !self.mock.is_enabled() {
            self.pin.write(high)?;
        }
        self.level.store(high, Ordering::SeqCst);
        debug!(device = %self.device.name(), kind = %self.kind, high, "Output driven");
        Ok(())
    }
}

impl<P: DigitalPin> Named for DigitalOutput<P> {
    fn name(&self) -> &str {
        self.device.name()
    }
}

impl<P: DigitalPin> Openable for DigitalOutput<P> {
    /// Claim the line and drive it low.
    fn open(&self) -> Result<()> {
        self.device.set_state(DeviceState::Initializing);
        info!(
            device = %self.device.name(),
            kind = %self.kind,
            mock = self.mock.is_enabled(),
            "Opening output"
        );
        self.drive(false).inspect_err(|e| {
            self.device.record_error(devnode_core::Error::initialization_failed(e.to_string()));
        })
    }

    /// Drive the line low before releasing it.
    fn close(&self) -> Result<()> {
        self.drive(false)
    }
}

impl<P: DigitalPin> Switchable for DigitalOutput<P> {
    fn on(&self) -> Result<()> {
        self.drive(true)
    }

    fn off(&self) -> Result<()> {
        self.drive(false)
    }
}

impl<P: DigitalPin> Component for DigitalOutput<P> {
    fn device(&self) -> &Device {
        &self.device
    }

    fn as_switchable(&self) -> Option<&dyn Switchable> {
        Some(self)
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        Some(self)
    }
}

impl<P> fmt::Debug for DigitalOutput<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalOutput")
            .field("device", &self.device)
            .field("kind", &self.kind)
            .field("level", &self.level)
            .field("topic", &self.topic)
            .finish()
    }
}
