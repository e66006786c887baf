//! Demo station wiring.
//!
//! One BME280-class sensor, one LED and one relay, registered under the
//! names `env`, `led` and `relay`. The binary has no GPIO or I2C backend of
//! its own, so the drivers sit on in-memory pins and buses; mock mode
//! additionally makes the sensor fabricate its readings.

use std::sync::Arc;

use devnode_core::{DeviceRegistry, MockSwitch, Named, Openable, Result, Supervisor};
use devnode_drivers::mock::{MockEnvironmentBus, MockPin};
use devnode_drivers::{
    ChannelPublisher, DigitalOutput, EnvSensor, OutputKind, Published, data_topic,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::NodeConfig;

pub struct Station {
    sensor: Arc<EnvSensor<MockEnvironmentBus>>,
    outputs: Vec<Arc<DigitalOutput<MockPin>>>,
}

impl Station {
    /// Build the devices and register them in `registry`.
    ///
    /// Returns the station and the receiver of everything it publishes.
    pub fn build(
        config: &NodeConfig,
        registry: &DeviceRegistry,
        mock: Arc<MockSwitch>,
    ) -> Result<(Self, mpsc::Receiver<Published>)> {
        let (publisher, rx) = ChannelPublisher::new(config.capacity);
        let publisher = Arc::new(publisher);

        let (bus, _script) = MockEnvironmentBus::new();
        let sensor = Arc::new(EnvSensor::new(
            "env",
            bus,
            publisher.clone(),
            data_topic(&config.station, "env"),
            mock.clone(),
        ));

        let outputs: Vec<_> = [
            ("led", OutputKind::Led, config.led_pin),
            ("relay", OutputKind::Relay, config.relay_pin),
        ]
        .into_iter()
        .map(|(name, kind, line)| {
            Arc::new(DigitalOutput::new(
                name,
                kind,
                MockPin::new(line),
                publisher.clone(),
                data_topic(&config.station, name),
                mock.clone(),
            ))
        })
        .collect();

        registry.add(sensor.clone())?;
        for output in &outputs {
            registry.add(output.clone())?;
        }

        Ok((Self { sensor, outputs }, rx))
    }

    /// Initialize the sensor and claim the output lines.
    pub async fn open(&self) -> Result<()> {
        self.sensor.init().await?;
        for output in &self.outputs {
            output.open()?;
        }
        info!(devices = 1 + self.outputs.len(), "Station opened");
        Ok(())
    }

    /// Start every device loop on `supervisor`.
    pub fn spawn(&self, supervisor: &mut Supervisor, config: &NodeConfig) -> Result<()> {
        let sensor = self.sensor.clone();
        supervisor.spawn(self.sensor.clone(), config.period(), move || {
            let sensor = sensor.clone();
            async move { sensor.read_publish().await }
        })?;

        for output in &self.outputs {
            let handle = output.clone();
            supervisor.spawn(output.clone(), config.output_period(), move || {
                let result = handle.publish_state();
                async move { result }
            })?;
        }
        Ok(())
    }

    /// Drive every output low.
    pub fn close(&self) {
        for output in &self.outputs {
            if let Err(err) = output.close() {
                warn!(device = %output.name(), error = %err, "Failed to release output");
            }
        }
    }
}
