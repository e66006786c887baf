//! Device lifecycle states.
//!
//! # Transitions
//!
//! - `Unknown` → `Initializing` (driver setup code)
//! - `Unknown`/`Initializing` → `Running` (periodic loop starts)
//! - any → `Error` (an error is captured on the device)
//! - `Running`/`Error` → `Stopped` (periodic loop cancelled)
//!
//! `Error` is sticky: a later successful tick does not move the device back
//! to `Running`. Only cancellation of the periodic loop leaves it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current operational state of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// Freshly constructed, nothing known yet.
    #[default]
    Unknown,

    /// Driver setup (bus/pin acquisition) in progress.
    Initializing,

    /// Periodic loop is ticking.
    Running,

    /// An error was captured. The periodic loop may still be ticking.
    Error,

    /// Periodic loop was cancelled.
    Stopped,
}

impl DeviceState {
    /// Lowercase name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
