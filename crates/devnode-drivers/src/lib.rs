//! Reference drivers built on `devnode-core`.
//!
//! This crate shows how concrete devices plug into the lifecycle
//! framework. Each driver embeds a [`Device`](devnode_core::Device),
//! implements [`Component`](devnode_core::Component) and exposes one
//! read-and-publish callback for [`Device::run_periodic`](devnode_core::Device::run_periodic).
//!
//! # Drivers
//!
//! - [`EnvSensor`]: BME280-class temperature, humidity and pressure sensor
//!   publishing a JSON document per tick.
//! - [`DigitalOutput`]: LED or relay on a GPIO line, switched by control
//!   messages and reporting `on`/`off`.
//!
//! # Seams
//!
//! Drivers talk to hardware through the traits in [`hardware`] and emit data
//! through a [`Publisher`]. The [`mock`] module provides in-memory pins and
//! buses for tests and development.
//!
//! When the [`MockSwitch`](devnode_core::MockSwitch) is enabled drivers do
//! not touch hardware at all: the sensor fabricates readings and outputs
//! only track the level they would have driven.

pub mod control;
pub mod env_sensor;
pub mod hardware;
pub mod mock;
pub mod output;
pub mod publish;

pub use control::{SwitchCommand, dispatch_command, run_control_loop};
pub use env_sensor::{EnvPayload, EnvSensor, celsius_to_fahrenheit};
pub use hardware::{DigitalPin, EnvReading, EnvironmentBus};
pub use output::{DigitalOutput, OutputKind};
pub use publish::{ChannelPublisher, Published, Publisher, control_topic, data_topic};
