//! Broker server
//!
//! Binds the two accept points, spawns the drain task and a handler task per
//! accepted connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::gateway::{EgressGateway, IngestGateway};
use crate::queue::MessageQueue;
use crate::registry::TopicRegistry;
use crate::server::config::BrokerConfig;
use crate::session::{ConnectionRole, SessionState};
use crate::stats::BrokerStats;
use crate::transport::TlsServerConfig;

/// Topic-routed message broker
///
/// Owns the queue, registry, and stats for one pipeline instance. All state
/// is constructed here and injected into the gateways, so multiple brokers
/// coexist in one process without interfering.
pub struct Broker {
    config: BrokerConfig,
    tls: TlsServerConfig,
    queue: Arc<MessageQueue>,
    registry: Arc<TopicRegistry>,
    stats: Arc<BrokerStats>,
    ingest: Arc<IngestGateway>,
    egress: Arc<EgressGateway>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl Broker {
    /// Create a new broker with the given configuration and TLS identity
    pub fn new(config: BrokerConfig, tls: TlsServerConfig) -> Self {
        let queue = Arc::new(MessageQueue::with_capacity(config.queue_capacity));
        let registry = Arc::new(TopicRegistry::new());
        let stats = Arc::new(BrokerStats::new());

        let ingest = Arc::new(IngestGateway::new(
            Arc::clone(&queue),
            Arc::clone(&stats),
            &config,
        ));
        let egress = Arc::new(EgressGateway::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::clone(&stats),
            &config,
        ));

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            tls,
            queue,
            registry,
            stats,
            ingest,
            egress,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the message queue
    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    /// Get a reference to the topic registry
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Get a reference to the broker counters
    pub fn stats(&self) -> &Arc<BrokerStats> {
        &self.stats
    }

    /// Run the broker
    ///
    /// Binds both configured addresses and blocks until shut down.
    pub async fn run(&self) -> Result<()> {
        let ingest = TcpListener::bind(self.config.ingest_addr).await?;
        let egress = TcpListener::bind(self.config.egress_addr).await?;
        self.serve(ingest, egress, std::future::pending()).await
    }

    /// Run the broker with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let ingest = TcpListener::bind(self.config.ingest_addr).await?;
        let egress = TcpListener::bind(self.config.egress_addr).await?;
        self.serve(ingest, egress, shutdown).await
    }

    /// Run the broker on pre-bound listeners
    ///
    /// Useful when the caller binds port 0 and needs the actual addresses.
    pub async fn run_with_listeners(&self, ingest: TcpListener, egress: TcpListener) -> Result<()> {
        self.serve(ingest, egress, std::future::pending()).await
    }

    async fn serve<F>(&self, ingest: TcpListener, egress: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tracing::info!(
            ingest = %ingest.local_addr()?,
            egress = %egress.local_addr()?,
            "Broker listening"
        );

        // The single logical consumer of the queue
        let drain_handle = {
            let egress_gateway = Arc::clone(&self.egress);
            tokio::spawn(async move { egress_gateway.run_drain_loop().await })
        };

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.accept_loop(&ingest, ConnectionRole::Producer) => {}
            _ = self.accept_loop(&egress, ConnectionRole::Consumer) => {}
        }

        drain_handle.abort();
        Ok(())
    }

    async fn accept_loop(&self, listener: &TcpListener, role: ConnectionRole) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_accept(socket, peer_addr, role);
                }
                Err(e) => {
                    tracing::error!(error = %e, role = %role, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_accept(&self, socket: TcpStream, peer_addr: SocketAddr, role: ConnectionRole) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, role = %role, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id,
            peer = %peer_addr,
            role = %role,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let acceptor = self.tls.acceptor();
        let ingest = Arc::clone(&self.ingest);
        let egress = Arc::clone(&self.egress);

        tokio::spawn(async move {
            let _permit = permit;

            let stream = match acceptor.accept(socket).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::debug!(session_id, error = %e, "TLS handshake failed");
                    return;
                }
            };

            let session = SessionState::new(session_id, peer_addr, role);
            let result = match role {
                ConnectionRole::Producer => ingest.handle_connection(session, stream).await,
                ConnectionRole::Consumer => egress.handle_consumer(session, stream).await,
            };

            if let Err(e) = result {
                tracing::debug!(session_id, error = %e, "Connection error");
            }

            tracing::debug!(session_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls_config() -> TlsServerConfig {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        TlsServerConfig::from_pem(
            cert.cert.pem().as_bytes(),
            cert.key_pair.serialize_pem().as_bytes(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_broker_starts_empty() {
        let broker = Broker::new(BrokerConfig::default(), tls_config());

        assert!(broker.queue().is_empty());
        assert_eq!(broker.registry().topic_count().await, 0);
        assert_eq!(broker.stats().snapshot().enqueued, 0);
    }

    #[tokio::test]
    async fn test_brokers_are_isolated() {
        let a = Broker::new(BrokerConfig::default(), tls_config());
        let b = Broker::new(BrokerConfig::default(), tls_config());

        a.queue().push(bytes::Bytes::from_static(b"x")).await.unwrap();

        assert_eq!(a.queue().len(), 1);
        assert!(b.queue().is_empty());
    }

    #[tokio::test]
    async fn test_queue_capacity_from_config() {
        let broker = Broker::new(BrokerConfig::default().queue_capacity(7), tls_config());
        assert_eq!(broker.queue().capacity(), 7);
    }
}
