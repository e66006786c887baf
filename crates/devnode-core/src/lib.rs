//! Device lifecycle framework for embedded control nodes.
//!
//! This crate gives every hardware-attached device (environment sensors,
//! relays, LEDs) the same lifecycle machinery so drivers only implement
//! their reading and writing logic:
//!
//! - [`Device`]: name, [`DeviceState`], polling period and last captured
//!   error, with a JSON status snapshot.
//! - [`Device::run_periodic`]: cancellable fixed-rate loop calling a
//!   driver's read-and-publish callback.
//! - [`DeviceRegistry`]: concurrent name-to-handle lookup table.
//! - [`MockSwitch`]: flag telling drivers to fabricate readings.
//! - [`Supervisor`]: one task per device loop, with collective shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! Unknown ──► Initializing ──► Running ──► Stopped
//!    │              │             │  ▲
//!    └──────────────┴──────► Error ─┘ (loop keeps ticking)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use devnode_core::{Device, DeviceRegistry, DeviceState, Error, ExecContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> devnode_core::Result<()> {
//! let registry = DeviceRegistry::new();
//! let device = Arc::new(Device::new("probe"));
//! registry.add(device.clone())?;
//!
//! let ctx = ExecContext::with_timeout(Duration::from_millis(20));
//! let result = device
//!     .run_periodic(&ctx, Duration::from_millis(5), || async { Ok::<(), Error>(()) })
//!     .await;
//!
//! assert!(result.unwrap_err().is_cancellation());
//! assert_eq!(device.state(), DeviceState::Stopped);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Argument and registration errors are returned to the caller. Errors from
//! a read-and-publish callback never leave the loop: they are captured on
//! the device, visible through [`Device::error`] and the JSON snapshot.

pub mod context;
pub mod device;
pub mod engine;
pub mod error;
pub mod mock;
pub mod registry;
pub mod state;
pub mod supervisor;
pub mod traits;

// Re-export commonly used types for convenience
pub use context::ExecContext;
pub use device::{Device, DeviceSnapshot, SharedError};
pub use error::{Error, Result};
pub use mock::{MockSwitch, is_mock, set_mock};
pub use registry::DeviceRegistry;
pub use state::DeviceState;
pub use supervisor::{ShutdownReport, Supervisor};
pub use traits::{Component, Named, Openable, Switchable};
