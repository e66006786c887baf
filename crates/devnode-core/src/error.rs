//! Error types for device lifecycle operations.
//!
//! This module defines the single error type shared by the device framework,
//! covering argument validation, registry misuse, cancellation of periodic
//! loops, and the operational failures reported by drivers.

use std::time::Duration;

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A periodic loop was started with an unusable period.
    #[error("Invalid period: {period:?}")]
    InvalidPeriod { period: Duration },

    /// A device could not be registered.
    #[error("Invalid device: {reason}")]
    InvalidDevice { reason: String },

    /// The execution context was cancelled explicitly.
    #[error("Operation cancelled")]
    Cancelled,

    /// The execution context reached its deadline.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// No device is registered under the requested name.
    #[error("Device not found: {name}")]
    NotFound { name: String },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Bus or pin communication error.
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// Invalid data received from a device or a control message.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Runtime configuration error.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new invalid period error.
    pub fn invalid_period(period: Duration) -> Self {
        Self::InvalidPeriod { period }
    }

    /// Create a new invalid device error.
    pub fn invalid_device(reason: impl Into<String>) -> Self {
        Self::InvalidDevice {
            reason: reason.into(),
        }
    }

    /// Create a new not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error is the terminal result of a cancelled context.
    ///
    /// Both explicit cancellation and deadline expiry count.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
