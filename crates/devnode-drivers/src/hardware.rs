//! Hardware access traits consumed by the drivers.
//!
//! These traits are the narrow seam between a driver and the bus or pin it
//! talks to. Real implementations wrap a GPIO character device or an I2C
//! bus; the [`mock`](crate::mock) module provides in-memory ones.
//!
//! [`DigitalPin`] is synchronous and object-safe: toggling a line does not
//! block. [`EnvironmentBus`] is async because a sensor conversion can take
//! tens of milliseconds.

use std::future::Future;

use devnode_core::Result;
use serde::{Deserialize, Serialize};

/// A single digital output line.
pub trait DigitalPin: Send + Sync {
    /// Drive the line high (`true`) or low (`false`).
    fn write(&self, high: bool) -> Result<()>;

    /// Current level of the line.
    fn read(&self) -> Result<bool>;
}

/// Raw environment measurement in SI-ish units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvReading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,

    /// Relative humidity in percent.
    pub humidity: f64,

    /// Pressure in hectopascal.
    pub pressure: f64,
}

impl EnvReading {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }
}

/// A temperature/humidity/pressure sensor on a bus (BME280 class).
pub trait EnvironmentBus: Send {
    /// Configure the sensor (oversampling, filter, standby) before reading.
    fn init(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Take one measurement.
    fn read(&mut self) -> impl Future<Output = Result<EnvReading>> + Send;
}
