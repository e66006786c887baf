//! # devnode
//!
//! Runs a demo station (environment sensor, LED, relay) on the devnode
//! device framework until Ctrl-C or a configured duration.
//!
//! # Usage
//!
//! ```bash
//! # Fabricated readings every 500 ms, stop after 10 s
//! devnode --mock --period-ms 500 --run-for-secs 10
//!
//! # Same, through the environment
//! DEVNODE_MOCK=1 DEVNODE_PERIOD_MS=500 devnode
//! ```
//!
//! While running, stdin accepts one command per line:
//!
//! - `<device> <on|off|1|0>`: switch an output
//! - `status`: print every device as JSON

mod config;
mod console;
mod station;

use anyhow::Context;
use devnode_core::{DeviceRegistry, ExecContext, MockSwitch, Supervisor};
use devnode_drivers::{Published, run_control_loop};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::NodeConfig;
use crate::station::Station;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_args();
    setup_tracing(&config);
    config.validate().context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        station = %config.station,
        mock = config.mock,
        "devnode starting"
    );

    let mock = MockSwitch::global();
    mock.set(config.mock);
    let registry = DeviceRegistry::global();

    let (station, data_rx) = Station::build(&config, &registry, mock)?;
    station.open().await.context("failed to open station")?;

    let ctx = match config.run_for() {
        Some(duration) => ExecContext::with_timeout(duration),
        None => ExecContext::new(),
    };

    let mut supervisor = Supervisor::new(ctx.child());
    station.spawn(&mut supervisor, &config)?;

    let (control_tx, control_rx) = mpsc::channel(config.capacity);
    let drain = tokio::spawn(drain_published(ctx.child(), data_rx));
    let control = tokio::spawn({
        let ctx = ctx.child();
        let registry = registry.clone();
        async move { run_control_loop(&ctx, &registry, control_rx).await }
    });
    let console = tokio::spawn(console::run_console(
        ctx.child(),
        console::spawn_stdin_reader()?,
        registry.clone(),
        config.station.clone(),
        control_tx,
    ));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Received shutdown signal");
        }
        cause = ctx.done() => info!(%cause, "Run duration elapsed"),
    }

    let report = supervisor.shutdown().await;
    ctx.cancel();
    station.close();

    console.await.context("console task failed")??;
    let applied = control.await.context("control task failed")?;
    drain.await.context("drain task failed")?;

    for snapshot in registry.snapshots() {
        info!(status = %serde_json::to_string(&snapshot)?, "Final device status");
    }
    info!(
        stopped = report.stopped,
        failed = report.failed,
        commands = applied,
        "devnode shutdown complete"
    );
    Ok(())
}

/// Setup tracing subscriber; `RUST_LOG` overrides the configured filter.
fn setup_tracing(config: &NodeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Log everything the station publishes.
async fn drain_published(ctx: ExecContext, mut rx: mpsc::Receiver<Published>) {
    loop {
        tokio::select! {
            biased;
            _ = ctx.done() => break,
            msg = rx.recv() => match msg {
                Some(msg) => info!(topic = %msg.topic, payload = %msg.payload_str(), "Published"),
                None => break,
            },
        }
    }

    // Flush what the loops emitted before they stopped.
    while let Ok(msg) = rx.try_recv() {
        info!(topic = %msg.topic, payload = %msg.payload_str(), "Published");
    }
}
