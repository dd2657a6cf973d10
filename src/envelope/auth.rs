//! Authentication handshake frames
//!
//! The first frame on every connection must be an [`AuthRequest`]. The server
//! answers a valid pair with an [`AuthAck`] and otherwise closes the
//! connection without replying, so a rejected client observes end-of-stream
//! where it expected the ack.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Credential pair presented by a connecting client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Username of the shared credential pair
    pub username: String,
    /// Password of the shared credential pair
    pub password: String,
}

/// Positive handshake acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAck {
    /// Always true; rejection is signalled by closing the connection instead
    pub ok: bool,
}

impl AuthRequest {
    /// Create a new request from a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Deserialize from wire bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl AuthAck {
    /// The acknowledgement sent on successful authentication
    pub fn accepted() -> Self {
        Self { ok: true }
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Deserialize from wire bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
