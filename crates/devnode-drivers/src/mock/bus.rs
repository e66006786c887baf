//! Mock environment sensor bus.
//!
//! The bus returns scripted readings pushed through a
//! [`MockEnvironmentBusHandle`]. When nothing is queued it repeats the last
//! reading it returned.

use devnode_core::{Error, Result};
use tokio::sync::mpsc;

use crate::hardware::{EnvReading, EnvironmentBus};

/// Scripted outcome of one bus read.
#[derive(Debug, Clone)]
enum Scripted {
    Reading(EnvReading),
    Failure(String),
}

/// Mock BME280-class bus for testing and development.
///
/// # Examples
///
/// ```
/// use devnode_drivers::hardware::{EnvReading, EnvironmentBus};
/// use devnode_drivers::mock::MockEnvironmentBus;
///
/// #[tokio::main]
/// async fn main() -> devnode_core::Result<()> {
///     let (mut bus, handle) = MockEnvironmentBus::new();
///
///     handle.push_reading(EnvReading::new(21.5, 40.0, 1013.2)).await?;
///     bus.init().await?;
///
///     let reading = bus.read().await?;
///     assert_eq!(reading.temperature, 21.5);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockEnvironmentBus {
    script_rx: mpsc::Receiver<Scripted>,
    last: EnvReading,
    initialized: bool,
}

impl MockEnvironmentBus {
    /// Create a bus with a room-temperature default reading.
    pub fn new() -> (Self, MockEnvironmentBusHandle) {
        Self::with_default(EnvReading::new(20.0, 45.0, 1013.25))
    }

    /// Create a bus that returns `reading` until told otherwise.
    pub fn with_default(reading: EnvReading) -> (Self, MockEnvironmentBusHandle) {
        let (script_tx, script_rx) = mpsc::channel(32);

        let bus = Self {
            script_rx,
            last: reading,
            initialized: false,
        };

        (bus, MockEnvironmentBusHandle { script_tx })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl EnvironmentBus for MockEnvironmentBus {
    async fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    async fn read(&mut self) -> Result<EnvReading> {
        if !self.initialized {
            return Err(Error::initialization_failed("sensor read before init"));
        }

        match self.script_rx.try_recv() {
            Ok(Scripted::Reading(reading)) => {
                self.last = reading;
                Ok(reading)
            }
            Ok(Scripted::Failure(message)) => Err(Error::communication(message)),
            Err(_) => Ok(self.last),
        }
    }
}

/// Handle for scripting a mock bus.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockEnvironmentBusHandle {
    script_tx: mpsc::Sender<Scripted>,
}

impl MockEnvironmentBusHandle {
    /// Queue a reading for the next read.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus has been dropped.
    pub async fn push_reading(&self, reading: EnvReading) -> Result<()> {
        self.send(Scripted::Reading(reading)).await
    }

    /// Make the next read fail with a communication error.
    pub async fn push_failure(&self, message: impl Into<String>) -> Result<()> {
        self.send(Scripted::Failure(message.into())).await
    }

    async fn send(&self, scripted: Scripted) -> Result<()> {
        self.script_tx
            .send(scripted)
            .await
            .map_err(|_| Error::communication("Mock bus script channel closed"))
    }
}
