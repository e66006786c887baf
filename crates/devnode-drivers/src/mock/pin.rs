//! Mock digital pin.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use devnode_core::{Error, Result};

use crate::hardware::DigitalPin;

/// In-memory output line.
///
/// Clones share the same line, so a test can keep one clone to inspect the
/// level while the driver owns another.
///
/// # Examples
///
/// ```
/// use devnode_drivers::hardware::DigitalPin;
/// use devnode_drivers::mock::MockPin;
///
/// let pin = MockPin::new(17);
/// let probe = pin.clone();
///
/// pin.write(true).unwrap();
/// assert!(probe.is_high());
/// ```
#[derive(Debug, Clone)]
pub struct MockPin {
    offset: u32,
    state: Arc<PinState>,
}

#[derive(Debug, Default)]
struct PinState {
    level: AtomicBool,
    writes: AtomicUsize,
    broken: AtomicBool,
}

impl MockPin {
    /// Create a low pin at `offset`.
    pub fn new(offset: u32) -> Self {
        Self {
            offset,
            state: Arc::new(PinState::default()),
        }
    }

    pub fn is_high(&self) -> bool {
        self.state.level.load(Ordering::SeqCst)
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent access fail, as if the line was released.
    pub fn set_broken(&self, broken: bool) {
        self.state.broken.store(broken, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.state.broken.load(Ordering::SeqCst) {
            return Err(Error::communication(format!(
                "GPIO line {} unavailable",
                self.offset
            )));
        }
        Ok(())
    }
}

impl DigitalPin for MockPin {
    fn write(&self, high: bool) -> Result<()> {
        self.check()?;
        self.state.level.store(high, Ordering::SeqCst);
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self) -> Result<bool> {
        self.check()?;
        Ok(self.is_high())
    }
}
