//! Client configuration

use crate::server::Credentials;
use crate::transport::DEFAULT_MAX_FRAME_SIZE;

/// Configuration shared by producer and consumer clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Broker address to connect to (`host:port`)
    pub addr: String,

    /// TLS server name the broker's certificate must match
    pub server_name: String,

    /// Credential pair presented on connect
    pub credentials: Credentials,

    /// Upper bound on a single frame's payload
    pub max_frame_size: usize,
}

impl ClientConfig {
    /// Create a config for the given broker address
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            server_name: "localhost".to_string(),
            credentials: Credentials::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the TLS server name
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the credential pair
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}
