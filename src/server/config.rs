//! Broker configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::server::auth::Credentials;
use crate::transport::DEFAULT_MAX_FRAME_SIZE;

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Address the ingestion gateway (producers) binds to
    pub ingest_addr: SocketAddr,

    /// Address the egress gateway (consumers) binds to
    pub egress_addr: SocketAddr,

    /// Maximum outstanding messages in the queue
    pub queue_capacity: usize,

    /// Per-consumer outbound channel capacity; overflow is dropped for that
    /// consumer only
    pub subscriber_buffer: usize,

    /// Upper bound on a single frame's payload
    pub max_frame_size: usize,

    /// How long a new connection may take to present credentials
    pub auth_deadline: Duration,

    /// Maximum concurrent connections across both listeners (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY on accepted sockets
    pub tcp_nodelay: bool,

    /// The shared credential pair every connection must present
    pub credentials: Credentials,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            ingest_addr: "0.0.0.0:8081".parse().unwrap(),
            egress_addr: "0.0.0.0:8082".parse().unwrap(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            subscriber_buffer: 64,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            auth_deadline: Duration::from_secs(10),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,
            credentials: Credentials::default(),
        }
    }
}

impl BrokerConfig {
    /// Set the ingestion bind address
    pub fn ingest_addr(mut self, addr: SocketAddr) -> Self {
        self.ingest_addr = addr;
        self
    }

    /// Set the egress bind address
    pub fn egress_addr(mut self, addr: SocketAddr) -> Self {
        self.egress_addr = addr;
        self
    }

    /// Set the queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-consumer outbound channel capacity (minimum 1)
    pub fn subscriber_buffer(mut self, capacity: usize) -> Self {
        self.subscriber_buffer = capacity.max(1);
        self
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the credential deadline for new connections
    pub fn auth_deadline(mut self, deadline: Duration) -> Self {
        self.auth_deadline = deadline;
        self
    }

    /// Set the connection limit (0 = unlimited)
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the credential pair
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}
