//! Operator console on stdin.
//!
//! Lines are read on a dedicated OS thread and forwarded over a channel.
//! A blocking stdin read cannot be cancelled, so it must never run on the
//! tokio runtime: the runtime would wait for it on shutdown. The reader
//! thread is detached and dies with the process.
//!
//! Accepted lines:
//!
//! - `<device> <on|off|1|0>`: forwarded as a control message
//! - `status`: every device snapshot printed as JSON

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use devnode_core::{DeviceRegistry, ExecContext};
use devnode_drivers::{Published, control_topic};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Start the stdin reader thread.
pub fn spawn_stdin_reader() -> anyhow::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::Builder::new()
        .name("devnode-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "Failed to read stdin");
                        break;
                    }
                }
            }
            debug!("stdin closed");
        })
        .context("failed to start stdin reader")?;

    Ok(rx)
}

/// What a console line asks for.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleCommand<'a> {
    Status,
    Control { device: &'a str, payload: &'a str },
    Blank,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> ConsoleCommand<'_> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => ConsoleCommand::Blank,
        (Some("status"), None) => ConsoleCommand::Status,
        (Some(device), Some(payload)) => ConsoleCommand::Control { device, payload },
        (Some(other), None) => ConsoleCommand::Unknown(other),
    }
}

/// Handle console lines until `ctx` ends or the line source closes.
pub async fn run_console(
    ctx: ExecContext,
    mut lines: mpsc::Receiver<String>,
    registry: Arc<DeviceRegistry>,
    station: String,
    control_tx: mpsc::Sender<Published>,
) -> anyhow::Result<()> {
    loop {
        let line = tokio::select! {
            biased;
            _ = ctx.done() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        match parse_line(&line) {
            ConsoleCommand::Blank => {}
            ConsoleCommand::Status => {
                for snapshot in registry.snapshots() {
                    println!("{}", serde_json::to_string(&snapshot)?);
                }
            }
            ConsoleCommand::Control { device, payload } => {
                let msg = Published {
                    topic: control_topic(&station, device),
                    payload: payload.as_bytes().to_vec(),
                };
                if control_tx.send(msg).await.is_err() {
                    break;
                }
            }
            ConsoleCommand::Unknown(other) => {
                warn!(input = %other, "Expected `status` or `<device> <command>`")
            }
        }
    }
    Ok(())
}
