//! Mock hardware implementations for testing and development.
//!
//! This module provides simulated pins and buses that can be controlled
//! programmatically without requiring physical hardware.

pub mod bus;
pub mod pin;

// Re-export commonly used types
pub use bus::{MockEnvironmentBus, MockEnvironmentBusHandle};
pub use pin::MockPin;
