//! Subscriber delivery handle
//!
//! The registry stores one of these per (topic, connection) membership. It
//! pairs the connection's stable session id with the sending half of that
//! connection's bounded outbound channel, whose receiving half is drained by
//! the connection's writer task.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::error::DeliveryError;

/// Delivery handle for one consumer connection
///
/// Cheap to clone: the same handle is inserted into every topic set the
/// connection subscribes to. Identity is the session id issued at accept
/// time, never structural equality of the underlying channel.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: u64,
    outbound: mpsc::Sender<Bytes>,
}

impl Subscriber {
    /// Create a handle from a session id and the connection's outbound sender
    pub fn new(id: u64, outbound: mpsc::Sender<Bytes>) -> Self {
        Self { id, outbound }
    }

    /// The owning connection's session id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Dispatch a payload toward this subscriber's connection
    ///
    /// Non-blocking: the payload is handed to the connection's writer task
    /// through the bounded outbound channel, so one slow or dead consumer
    /// never stalls the drain loop or the other subscribers of the topic.
    pub fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        match self.outbound.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DeliveryError::Lagged),
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
        }
    }
}
