//! Registry error types
//!
//! Error types for per-subscriber delivery attempts.

/// Why a fan-out delivery to one subscriber did not happen
///
/// Either way the failure is scoped to that subscriber; the drain loop keeps
/// delivering to the remaining members of the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber's outbound channel is full (consumer too slow);
    /// the message is dropped for this subscriber only
    Lagged,
    /// The subscriber's outbound channel is closed (connection dead);
    /// the connection should be removed from every topic set
    Closed,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Lagged => write!(f, "subscriber lagging, message dropped"),
            DeliveryError::Closed => write!(f, "subscriber connection closed"),
        }
    }
}

impl std::error::Error for DeliveryError {}
