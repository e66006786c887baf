//! Periodic read-and-publish loop.
//!
//! [`Device::run_periodic`] drives a device through its running lifecycle:
//! it validates the period, marks the device `Running`, and invokes the
//! driver's callback on a fixed-rate schedule until the [`ExecContext`]
//! ends.
//!
//! ```text
//! start ──► validate period ──► Running ──► tick ──► callback ─┐
//!                │                  ▲                          │
//!                ▼                  └──── Ok / Err recorded ◄──┘
//!         InvalidPeriod                       │
//!                                   context done ──► Stopped
//! ```
//!
//! A failing callback is recorded on the device and logged, and the loop
//! keeps going. There is no backoff: the next tick fires on schedule.
//! Cancellation is observed only between ticks, so a callback that hangs
//! delays shutdown until it returns.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::context::ExecContext;
use crate::device::Device;
use crate::state::DeviceState;
use crate::{Error, Result};

/// Longest interval handed to the ticker. Longer periods are valid but the
/// first tick never arrives within the lifetime of a process, and clamping
/// keeps `Instant` arithmetic from overflowing.
const MAX_TICK_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

impl Device {
    /// Run `readpub` every `period` until `ctx` ends.
    ///
    /// Blocks for the lifetime of the device. Only one loop may drive a
    /// given device at a time.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPeriod`] if `period` is zero. The device state is
    ///   left unchanged and `readpub` is never called.
    /// - [`Error::Cancelled`] or [`Error::DeadlineExceeded`] once the
    ///   context ends. The device is `Stopped` by then.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use devnode_core::{Device, DeviceState, Error, ExecContext};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let device = Device::new("probe");
    /// let ctx = ExecContext::with_timeout(Duration::from_millis(30));
    ///
    /// let result = device
    ///     .run_periodic(&ctx, Duration::from_millis(5), || async { Ok::<(), Error>(()) })
    ///     .await;
    ///
    /// assert!(matches!(result, Err(Error::DeadlineExceeded)));
    /// assert_eq!(device.state(), DeviceState::Stopped);
    /// # }
    /// ```
    pub async fn run_periodic<F, Fut, E>(
        &self,
        ctx: &ExecContext,
        period: Duration,
        mut readpub: F,
    ) -> Result<Infallible>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(Error::invalid_period(period));
        }

        self.mark_running(period);
        info!(device = %self.name(), ?period, "Periodic loop started");

        let tick_period = period.min(MAX_TICK_PERIOD);
        let mut ticker = time::interval_at(Instant::now() + tick_period, tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                cause = ctx.done() => {
                    self.set_state(DeviceState::Stopped);
                    info!(device = %self.name(), reason = %cause, "Periodic loop stopped");
                    return Err(cause);
                }
                _ = ticker.tick() => {
                    if let Err(err) = readpub().await {
                        error!(device = %self.name(), error = %err, "Periodic read failed");
                        self.record_error(err);
                    } else {
                        debug!(device = %self.name(), "Tick completed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback(
        calls: Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<std::result::Result<(), Error>> {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_zero_period_never_calls_back() {
        let device = Device::new("test-device");
        device.set_state(DeviceState::Initializing);
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ExecContext::with_timeout(Duration::from_millis(50));

        let result = device
            .run_periodic(&ctx, Duration::ZERO, counting_callback(calls.clone()))
            .await;

        assert!(matches!(result, Err(Error::InvalidPeriod { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(device.state(), DeviceState::Initializing);
        assert_eq!(device.period(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_deadline() {
        let device = Device::new("test-device");
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ExecContext::with_timeout(Duration::from_millis(50));

        let result = device
            .run_periodic(&ctx, Duration::from_millis(10), counting_callback(calls.clone()))
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert_eq!(device.state(), DeviceState::Stopped);
        assert_eq!(device.period(), Duration::from_millis(10));

        let calls = calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected at least 2 ticks, got {calls}");
        assert!(calls <= 5, "expected at most 5 ticks, got {calls}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_cancel_reports_cancelled() {
        let device = Arc::new(Device::new("test-device"));
        let ctx = ExecContext::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let task = {
            let device = device.clone();
            let ctx = ctx.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                device
                    .run_periodic(&ctx, Duration::from_millis(10), counting_callback(calls))
                    .await
            })
        };

        time::sleep(Duration::from_millis(35)).await;
        assert_eq!(device.state(), DeviceState::Running);
        ctx.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(device.state(), DeviceState::Stopped);
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_loop() {
        let device = Device::new("flaky");
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ExecContext::with_timeout(Duration::from_millis(100));

        let counter = calls.clone();
        let result = device
            .run_periodic(&ctx, Duration::from_millis(10), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n % 2 == 0 {
                        Err(Error::communication(format!("read {n} failed")))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert_eq!(device.state(), DeviceState::Stopped);

        let total = calls.load(Ordering::SeqCst);
        assert!(total >= 4, "loop stopped early after {total} ticks");

        let last_failing = if total % 2 == 0 { total } else { total - 1 };
        let err = device.error().unwrap();
        assert_eq!(
            err.to_string(),
            format!("Communication error: read {last_failing} failed")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_state_is_sticky_while_running() {
        let device = Arc::new(Device::new("sticky"));
        let ctx = ExecContext::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let task = {
            let device = device.clone();
            let ctx = ctx.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                device
                    .run_periodic(&ctx, Duration::from_millis(10), move || {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        async move {
                            if n == 0 {
                                Err(Error::other("first read failed"))
                            } else {
                                Ok(())
                            }
                        }
                    })
                    .await
            })
        };

        time::sleep(Duration::from_millis(55)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(device.state(), DeviceState::Error);

        ctx.cancel();
        let _ = task.await.unwrap();
        assert_eq!(device.state(), DeviceState::Stopped);
        assert_eq!(device.error().unwrap().to_string(), "first read failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_fixed_rate() {
        let device = Device::new("metronome");
        let ctx = ExecContext::with_timeout(Duration::from_millis(45));
        let fired = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let start = Instant::now();

        let log = fired.clone();
        let _ = device
            .run_periodic(&ctx, Duration::from_millis(10), move || {
                log.lock().push(start.elapsed());
                async {
                    // Slow callback must not push later ticks off schedule.
                    time::sleep(Duration::from_millis(3)).await;
                    Ok::<(), Error>(())
                }
            })
            .await;

        let fired = fired.lock().clone();
        assert_eq!(
            fired,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30),
                Duration::from_millis(40),
            ]
        );
    }

    #[tokio::test]
    async fn test_huge_period_on_cancelled_context() {
        let device = Device::new("slow");
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ExecContext::new();
        ctx.cancel();

        let result = device
            .run_periodic(&ctx, Duration::MAX, counting_callback(calls.clone()))
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(device.state(), DeviceState::Stopped);
        assert_eq!(device.period(), Duration::MAX);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_period_runs_until_deadline() {
        let device = Device::new("slow");
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ExecContext::with_timeout(Duration::from_millis(50));

        let result = device
            .run_periodic(
                &ctx,
                Duration::from_secs(u64::MAX / 2),
                counting_callback(calls.clone()),
            )
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert_eq!(device.state(), DeviceState::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
