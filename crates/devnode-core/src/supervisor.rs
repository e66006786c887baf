//! Task-per-device runner for periodic loops.
//!
//! The [`Supervisor`] spawns one tokio task per device, each running
//! [`Device::run_periodic`](crate::Device::run_periodic) under a child of the
//! supervisor's [`ExecContext`]. There is no shared tick: every device runs
//! on its own timer.
//!
//! ```text
//! ┌──────────┐
//! │ bme280   │──► run_periodic(child ctx) ──► read_publish()
//! │ task     │
//! └──────────┘        ▲
//! ┌──────────┐        │ cancel
//! │ led      │──► ... │
//! │ task     │   ┌────┴───────┐
//! └──────────┘   │ Supervisor │ ctx
//!                └────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use devnode_core::{Device, Error, ExecContext, Supervisor};
//!
//! # async fn example() {
//! let mut supervisor = Supervisor::new(ExecContext::new());
//! let probe = Arc::new(Device::new("probe"));
//!
//! supervisor
//!     .spawn(probe, Duration::from_secs(1), || async { Ok::<(), Error>(()) })
//!     .unwrap();
//!
//! // ... later, on shutdown
//! let report = supervisor.shutdown().await;
//! assert_eq!(report.stopped, 1);
//! # }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::context::ExecContext;
use crate::traits::Component;
use crate::{Error, Result};

/// How a device task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    /// Loop returned after its context was cancelled or timed out.
    Stopped,
    /// Loop returned an error other than its context ending.
    Failed,
    /// Task was aborted.
    Aborted,
    /// Task panicked.
    Panic,
}

/// Outcome counts collected by [`Supervisor::shutdown`] and
/// [`Supervisor::wait`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Loops that ended through their context.
    pub stopped: usize,
    /// Loops that returned any other error.
    pub failed: usize,
    /// Tasks that were aborted.
    pub aborted: usize,
    /// Tasks that panicked.
    pub panicked: usize,
}

impl ShutdownReport {
    /// Whether every task ended through its context.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.aborted == 0 && self.panicked == 0
    }

    fn record(&mut self, termination: TaskTermination) {
        match termination {
            TaskTermination::Stopped => self.stopped += 1,
            TaskTermination::Failed => self.failed += 1,
            TaskTermination::Aborted => self.aborted += 1,
            TaskTermination::Panic => self.panicked += 1,
        }
    }
}

/// Owns the periodic loops of a set of devices.
pub struct Supervisor {
    ctx: ExecContext,
    tasks: JoinSet<(String, Result<Infallible>)>,
}

impl Supervisor {
    /// Create a supervisor whose loops end when `ctx` ends.
    pub fn new(ctx: ExecContext) -> Self {
        Self {
            ctx,
            tasks: JoinSet::new(),
        }
    }

    /// Start the periodic loop of `component` on its own task.
    ///
    /// The loop calls `readpub` every `period`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPeriod`](crate::Error::InvalidPeriod) if `period` is
    /// zero. No task is started and the device is left untouched.
    pub fn spawn<C, F, Fut, E>(
        &mut self,
        component: Arc<C>,
        period: Duration,
        readpub: F,
    ) -> Result<()>
    where
        C: Component + ?Sized + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        if period.is_zero() {
            warn!(device = %component.name(), "Refusing to start loop with zero period");
            return Err(Error::invalid_period(period));
        }

        let ctx = self.ctx.child();
        self.tasks.spawn(async move {
            let device = component.device();
            let result = device.run_periodic(&ctx, period, readpub).await;
            (device.name().to_string(), result)
        });
        Ok(())
    }

    /// Number of loops not yet collected.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancel every loop and wait for all of them to finish.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.ctx.cancel();
        self.collect().await
    }

    /// Wait for every loop to finish without cancelling.
    ///
    /// Only returns once the context ends (deadline or external cancel).
    pub async fn wait(mut self) -> ShutdownReport {
        self.collect().await
    }

    async fn collect(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        while let Some(result) = self.tasks.join_next().await {
            report.record(Self::classify_task_result(result));
        }

        if report.is_clean() {
            info!(stopped = report.stopped, "All device loops stopped");
        } else {
            warn!(
                stopped = report.stopped,
                failed = report.failed,
                aborted = report.aborted,
                panicked = report.panicked,
                "Device loops ended abnormally"
            );
        }
        report
    }

    /// Classify the termination status of a task.
    fn classify_task_result(
        result: std::result::Result<(String, Result<Infallible>), JoinError>,
    ) -> TaskTermination {
        match result {
            Ok((_, Err(err))) if err.is_cancellation() => TaskTermination::Stopped,
            Ok((name, Err(err))) => {
                warn!(device = %name, error = %err, "Device loop failed");
                TaskTermination::Failed
            }
            Err(e) if e.is_cancelled() => TaskTermination::Aborted,
            Err(_) => TaskTermination::Panic,
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("ctx", &self.ctx)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
