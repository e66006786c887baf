//! The device entity shared by every driver.
//!
//! A [`Device`] tracks one hardware endpoint: its name, lifecycle state,
//! polling period and the last error captured while driving it. Drivers hold
//! a `Device` (composition, not inheritance) and forward to it.
//!
//! All mutable fields sit behind a single reader/writer lock, so a snapshot
//! taken concurrently with [`Device::set_error`] observes either the state
//! before the error or the state after it, never a mix.
//!
//! # Examples
//!
//! ```
//! use devnode_core::{Device, DeviceState, Error};
//!
//! let device = Device::new("bme280");
//! assert_eq!(device.state(), DeviceState::Unknown);
//!
//! device.record_error(Error::communication("i2c read failed"));
//! assert_eq!(device.state(), DeviceState::Error);
//!
//! let json = device.to_json().unwrap();
//! assert!(json.contains("\"State\":\"error\""));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::state::DeviceState;

/// Error captured on a device.
///
/// Shared so that [`Device::error`] can hand out the stored error without
/// holding the lock.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A managed hardware endpoint.
#[derive(Debug)]
pub struct Device {
    name: String,
    inner: RwLock<DeviceInner>,
}

#[derive(Debug, Default)]
struct DeviceInner {
    state: DeviceState,
    period: Duration,
    last_error: Option<SharedError>,
}

impl Device {
    /// Create a device in the `Unknown` state with no error.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(DeviceInner::default()),
        }
    }

    /// Registry key of this device.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> DeviceState {
        self.inner.read().state
    }

    /// Set the lifecycle state directly.
    ///
    /// Intended for driver setup code (`Initializing`). `Running` and
    /// `Stopped` are owned by the periodic loop.
    pub fn set_state(&self, state: DeviceState) {
        self.inner.write().state = state;
    }

    /// Period recorded by the last periodic loop started on this device.
    pub fn period(&self) -> Duration {
        self.inner.read().period
    }

    /// Record `err` as the last error.
    ///
    /// `Some` forces the state to `Error` whatever it was before. `None`
    /// clears the stored error and leaves the state untouched.
    pub fn set_error(&self, err: Option<SharedError>) {
        let mut inner = self.inner.write();
        if err.is_some() {
            inner.state = DeviceState::Error;
        }
        inner.last_error = err;
    }

    /// Capture an error, forcing the state to `Error`.
    pub fn record_error<E>(&self, err: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.set_error(Some(Arc::new(err)));
    }

    /// Drop the stored error without changing state.
    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Last captured error, if any.
    pub fn error(&self) -> Option<SharedError> {
        self.inner.read().last_error.clone()
    }

    /// Consistent view of the device for status reporting.
    pub fn snapshot(&self) -> DeviceSnapshot {
        let inner = self.inner.read();
        DeviceSnapshot {
            name: self.name.clone(),
            state: inner.state,
            period: inner.period,
            error: inner
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        }
    }

    /// Serialize [`Device::snapshot`] to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub(crate) fn mark_running(&self, period: Duration) {
        let mut inner = self.inner.write();
        inner.period = period;
        inner.state = DeviceState::Running;
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.state())
    }
}

/// Serialized status of a device.
///
/// ```json
/// {"Name":"bme280","State":"running","Period":1000000000,"Error":""}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSnapshot {
    pub name: String,
    pub state: DeviceState,
    /// Period in nanoseconds on the wire.
    #[serde(with = "duration_nanos")]
    pub period: Duration,
    /// Display string of the last error, empty if none.
    pub error: String,
}

impl DeviceSnapshot {
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(period: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(period.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use proptest::prelude::*;

    #[test]
    fn test_new_device() {
        let device = Device::new("test-device");
        assert_eq!(device.name(), "test-device");
        assert_eq!(device.state(), DeviceState::Unknown);
        assert_eq!(device.period(), Duration::ZERO);
        assert!(device.error().is_none());
    }

    #[test]
    fn test_set_state() {
        let device = Device::new("test-device");
        for state in [
            DeviceState::Initializing,
            DeviceState::Running,
            DeviceState::Error,
            DeviceState::Stopped,
        ] {
            device.set_state(state);
            assert_eq!(device.state(), state);
        }
    }

    #[test]
    fn test_set_error_forces_error_state() {
        let device = Device::new("test-device");
        let err: SharedError = Arc::new(Error::other("test error"));

        device.set_error(Some(err.clone()));

        let stored = device.error().unwrap();
        assert!(Arc::ptr_eq(&stored, &err));
        assert_eq!(device.state(), DeviceState::Error);
    }

    #[test]
    fn test_set_error_none_keeps_state() {
        let device = Device::new("test-device");
        device.set_state(DeviceState::Running);
        device.record_error(Error::other("transient"));
        device.set_state(DeviceState::Running);

        device.clear_error();

        assert!(device.error().is_none());
        assert_eq!(device.state(), DeviceState::Running);
    }

    #[test]
    fn test_display() {
        let device = Device::new("led");
        assert_eq!(device.to_string(), "led (unknown)");

        device.set_state(DeviceState::Running);
        assert_eq!(device.to_string(), "led (running)");
    }

    #[test]
    fn test_json_fields() {
        let device = Device::new("bme280");
        device.mark_running(Duration::from_millis(10));

        let value: serde_json::Value = serde_json::from_str(&device.to_json().unwrap()).unwrap();
        assert_eq!(value["Name"], "bme280");
        assert_eq!(value["State"], "running");
        assert_eq!(value["Period"], 10_000_000);
        assert_eq!(value["Error"], "");
    }

    #[test]
    fn test_json_round_trip_with_error() {
        let device = Device::new("bme280");
        device.record_error(Error::communication("bus timeout"));

        let json = device.to_json().unwrap();
        let decoded: DeviceSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.name, "bme280");
        assert_eq!(decoded.state, DeviceState::Error);
        assert_eq!(decoded.error, "Communication error: bus timeout");
        assert!(decoded.has_error());
        assert_eq!(decoded, device.snapshot());
    }

    fn any_state() -> impl Strategy<Value = DeviceState> {
        prop_oneof![
            Just(DeviceState::Unknown),
            Just(DeviceState::Initializing),
            Just(DeviceState::Running),
            Just(DeviceState::Error),
            Just(DeviceState::Stopped),
        ]
    }

    proptest! {
        #[test]
        fn prop_new_device_is_unknown(name in "[a-z0-9_-]{1,32}") {
            let device = Device::new(name.clone());
            prop_assert_eq!(device.name(), name.as_str());
            prop_assert_eq!(device.state(), DeviceState::Unknown);
            prop_assert!(device.error().is_none());
        }

        #[test]
        fn prop_error_always_wins(prior in any_state(), message in ".{0,64}") {
            let device = Device::new("dev");
            device.set_state(prior);
            device.record_error(Error::other(message.clone()));

            prop_assert_eq!(device.state(), DeviceState::Error);
            prop_assert_eq!(device.error().map(|e| e.to_string()), Some(message));
        }
    }
}
