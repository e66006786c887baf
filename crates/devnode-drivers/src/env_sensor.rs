//! Temperature, humidity and pressure sensor driver.
//!
//! [`EnvSensor`] wraps an [`EnvironmentBus`] (BME280 class) and publishes
//! one JSON document per periodic tick:
//!
//! ```json
//! {"temperature":"70.52","humidity":"41.20","pressure":"1012.80"}
//! ```
//!
//! Temperature is published in degrees Fahrenheit. All values are formatted
//! with two decimals.
//!
//! When the [`MockSwitch`] is enabled the bus is neither initialized nor
//! read; [`EnvSensor::read`] fabricates values between 0 and 100 instead.

use std::sync::Arc;

use devnode_core::{Component, Device, DeviceState, MockSwitch, Named, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::hardware::{EnvReading, EnvironmentBus};
use crate::publish::Publisher;

/// Published sensor payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPayload {
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
}

impl From<EnvReading> for EnvPayload {
    fn from(reading: EnvReading) -> Self {
        Self {
            temperature: format!("{:.2}", celsius_to_fahrenheit(reading.temperature)),
            humidity: format!("{:.2}", reading.humidity),
            pressure: format!("{:.2}", reading.pressure),
        }
    }
}

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Environment sensor driver.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use devnode_core::MockSwitch;
/// use devnode_drivers::env_sensor::EnvSensor;
/// use devnode_drivers::mock::MockEnvironmentBus;
/// use devnode_drivers::publish::ChannelPublisher;
///
/// #[tokio::main]
/// async fn main() -> devnode_core::Result<()> {
///     let (bus, _handle) = MockEnvironmentBus::new();
///     let (publisher, mut rx) = ChannelPublisher::new(8);
///     let sensor = EnvSensor::new(
///         "bme280",
///         bus,
///         Arc::new(publisher),
///         "station/bme280/data",
///         Arc::new(MockSwitch::new()),
///     );
///
///     sensor.init().await?;
///     sensor.read_publish().await?;
///
///     let msg = rx.recv().await.unwrap();
///     assert!(msg.payload_str().contains("\"temperature\":\"68.00\""));
///     Ok(())
/// }
/// ```
pub struct EnvSensor<B> {
    device: Device,
    bus: Mutex<B>,
    publisher: Arc<dyn Publisher>,
    topic: String,
    mock: Arc<MockSwitch>,
}

impl<B: EnvironmentBus> EnvSensor<B> {
    pub fn new(
        name: impl Into<String>,
        bus: B,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
        mock: Arc<MockSwitch>,
    ) -> Self {
        Self {
            device: Device::new(name),
            bus: Mutex::new(bus),
            publisher,
            topic: topic.into(),
            mock,
        }
    }

    /// Prepare the sensor for reading.
    ///
    /// Marks the device `Initializing`. Initialization failures are captured
    /// on the device and returned.
    pub async fn init(&self) -> Result<()> {
        self.device.set_state(DeviceState::Initializing);
        if self.mock.is_enabled() {
            info!(device = %self.device.name(), "Mock mode, skipping sensor init");
            return Ok(());
        }

        let result = self.bus.lock().await.init().await;
        if let Err(err) = &result {
            self.device.record_error(devnode_core::Error::initialization_failed(err.to_string()));
        }
        result
    }

    /// Take one reading, fabricated in mock mode.
    pub async fn read(&self) -> Result<EnvReading> {
        if self.mock.is_enabled() {
            return Ok(synthetic_reading());
        }
        self.bus.lock().await.read().await
    }

    /// Read the sensor and publish the formatted payload.
    ///
    /// This is the periodic callback of the sensor.
    pub async fn read_publish(&self) -> Result<()> {
        let reading = self.read().await?;
        let payload = serde_json::to_vec(&EnvPayload::from(reading))?;

        debug!(device = %self.device.name(), ?reading, "Publishing reading");
        self.publisher.publish(&self.topic, payload)
    }
}

fn synthetic_reading() -> EnvReading {
    let mut rng = rand::thread_rng();
    EnvReading::new(
        rng.gen_range(0.0..100.0),
        rng.gen_range(0.0..100.0),
        rng.gen_range(0.0..100.0),
    )
}

impl<B: EnvironmentBus> Named for EnvSensor<B> {
    fn name(&self) -> &str {
        self.device.name()
    }
}

impl<B: EnvironmentBus + 'static> Component for EnvSensor<B> {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl<B> std::fmt::Debug for EnvSensor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSensor")
            .field("device", &self.device)
            .field("topic", &self.topic)
            .finish()
    }
}
