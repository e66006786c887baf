//! Control-message handling.
//!
//! Inbound control messages name a device and carry a textual command. They
//! are resolved through the [`DeviceRegistry`] and applied to components
//! that declare the [`Switchable`](devnode_core::Switchable) capability.
//!
//! [`run_control_loop`] consumes messages from a channel until its context
//! ends. Failures are logged and the loop keeps going, the same way a
//! periodic loop absorbs read failures.

use std::str::FromStr;

use devnode_core::{DeviceRegistry, Error, ExecContext, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::publish::Published;

/// Parsed on/off command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    On,
    Off,
}

impl FromStr for SwitchCommand {
    type Err = Error;

    /// Accepts `on`/`off`/`1`/`0`, case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("on") || s == "1" {
            Ok(Self::On)
        } else if s.eq_ignore_ascii_case("off") || s == "0" {
            Ok(Self::Off)
        } else {
            Err(Error::invalid_data(format!("unknown switch command: {s:?}")))
        }
    }
}

/// Apply `payload` to the switchable device registered as `name`.
///
/// # Errors
///
/// - [`Error::NotFound`] if no device has that name.
/// - [`Error::Unsupported`] if the device cannot be switched.
/// - [`Error::InvalidData`] if the payload is not a switch command.
pub fn dispatch_command(
    registry: &DeviceRegistry,
    name: &str,
    payload: &str,
) -> Result<SwitchCommand> {
    let component = registry.get(name).ok_or_else(|| Error::not_found(name))?;
    let switch = component
        .as_switchable()
        .ok_or_else(|| Error::unsupported(format!("switch command for {name}")))?;

    let command = payload.parse::<SwitchCommand>()?;
    match command {
        SwitchCommand::On => switch.on()?,
        SwitchCommand::Off => switch.off()?,
    }

    info!(device = %name, ?command, "Control command applied");
    Ok(command)
}

/// Extract the device name from a `<station>/<device>/control` topic.
pub fn device_from_control_topic(topic: &str) -> Option<&str> {
    let mut parts = topic.rsplit('/');
    match (parts.next(), parts.next()) {
        (Some("control"), Some(device)) if !device.is_empty() => Some(device),
        _ => None,
    }
}

/// Dispatch control messages from `rx` until `ctx` ends or the channel closes.
///
/// Returns the number of commands applied successfully.
pub async fn run_control_loop(
    ctx: &ExecContext,
    registry: &DeviceRegistry,
    mut rx: mpsc::Receiver<Published>,
) -> usize {
    let mut applied = 0;

    loop {
        let msg = tokio::select! {
            biased;
            _ = ctx.done() => break,
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let Some(device) = device_from_control_topic(&msg.topic) else {
            warn!(topic = %msg.topic, "Ignoring message on non-control topic");
            continue;
        };

        match dispatch_command(registry, device, &msg.payload_str()) {
            Ok(_) => applied += 1,
            Err(err) => warn!(device = %device, error = %err, "Control command failed"),
        }
    }

    applied
}
