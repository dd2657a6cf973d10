//! Crate-level error types
//!
//! A single error enum covers transport, codec, and broker failures so that
//! connection handlers can propagate everything with `?`.

use std::io;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for broker and client operations
#[derive(Debug)]
pub enum Error {
    /// Underlying transport I/O failure
    Io(io::Error),
    /// TLS configuration or handshake setup failure
    Tls(String),
    /// Envelope (de)serialization failure
    Codec(serde_json::Error),
    /// Structurally valid JSON that violates an envelope invariant
    InvalidEnvelope(&'static str),
    /// Credentials rejected, missing, or not presented in time
    AuthenticationFailed,
    /// Peer closed the connection before the expected frame arrived
    ConnectionClosed,
    /// The queue was closed and accepts no further messages
    QueueClosed,
    /// The queue is at capacity (non-blocking push only)
    QueueFull,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Tls(msg) => write!(f, "TLS error: {}", msg),
            Error::Codec(e) => write!(f, "envelope codec error: {}", e),
            Error::InvalidEnvelope(msg) => write!(f, "invalid envelope: {}", msg),
            Error::AuthenticationFailed => write!(f, "authentication failed"),
            Error::ConnectionClosed => write!(f, "connection closed by peer"),
            Error::QueueClosed => write!(f, "queue closed"),
            Error::QueueFull => write!(f, "queue full"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(e)
    }
}
