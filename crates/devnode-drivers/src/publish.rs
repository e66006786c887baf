//! Outbound message seam.
//!
//! Drivers emit their data through a [`Publisher`]. The transport behind it
//! (MQTT or otherwise) lives outside this crate; [`ChannelPublisher`] hands
//! messages to a tokio channel so an application task, or a test, can
//! consume them.

use devnode_core::{Error, Result};
use tokio::sync::mpsc;
use tracing::trace;

/// A message emitted by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Published {
    /// Payload as UTF-8 text, lossily decoded.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Sink for driver data.
///
/// Implementations must not block: publishing happens on the device's
/// periodic loop.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
}

/// Publisher backed by a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<Published>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver draining it.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Published>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        trace!(topic, bytes = payload.len(), "Publishing");
        self.tx
            .try_send(Published {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::communication(format!("publish queue full for {topic}"))
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::communication("publish channel closed")
                }
            })
    }
}

/// Topic on which a device publishes its data.
pub fn data_topic(station: &str, device: &str) -> String {
    format!("{station}/{device}/data")
}

/// Topic on which a device receives control messages.
pub fn control_topic(station: &str, device: &str) -> String {
    format!("{station}/{device}/control")
}
