//! Ingestion gateway
//!
//! Accepts producer connections, authenticates them, and forwards every frame
//! they send into the queue unmodified. Each producer's read loop runs in its
//! own task; the only state shared between producers is the queue handle, so
//! one producer failing never affects the others or the queue's contents.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::gateway::handshake;
use crate::queue::MessageQueue;
use crate::server::{BrokerConfig, Credentials};
use crate::session::SessionState;
use crate::stats::BrokerStats;
use crate::transport::{framed_split, FramedReader};

/// Producer-side gateway: authenticate, then read-and-enqueue until the
/// connection ends
pub struct IngestGateway {
    queue: Arc<MessageQueue>,
    stats: Arc<BrokerStats>,
    credentials: Credentials,
    auth_deadline: Duration,
    max_frame_size: usize,
}

impl IngestGateway {
    /// Create the gateway over a shared queue
    pub fn new(queue: Arc<MessageQueue>, stats: Arc<BrokerStats>, config: &BrokerConfig) -> Self {
        Self {
            queue,
            stats,
            credentials: config.credentials.clone(),
            auth_deadline: config.auth_deadline,
            max_frame_size: config.max_frame_size,
        }
    }

    /// Drive one producer connection to completion
    ///
    /// Returns `Ok(())` when the peer disconnects cleanly. Any error is
    /// scoped to this connection: the queue keeps everything already
    /// enqueued and other producers are unaffected.
    pub async fn handle_connection<S>(&self, mut session: SessionState, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = framed_split(stream, self.max_frame_size);

        if let Err(e) = handshake::authenticate(
            &mut reader,
            &mut writer,
            &self.credentials,
            self.auth_deadline,
        )
        .await
        {
            if matches!(e, Error::AuthenticationFailed) {
                self.stats.record_auth_failure();
                tracing::warn!(
                    session_id = session.id,
                    peer = %session.peer_addr,
                    "Producer rejected: invalid credentials"
                );
            }
            session.close();
            return Err(e);
        }
        session.authenticate();
        tracing::debug!(session_id = session.id, peer = %session.peer_addr, "Producer authenticated");

        let result = self.read_loop(&mut session, &mut reader).await;

        session.close();
        tracing::debug!(
            session_id = session.id,
            frames = session.frames_in,
            duration_ms = session.duration().as_millis() as u64,
            "Producer disconnected"
        );
        result
    }

    async fn read_loop<S>(
        &self,
        session: &mut SessionState,
        reader: &mut FramedReader<S>,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        while let Some(frame) = reader.next().await {
            let frame = frame?;
            session.on_frame();

            // Backpressure point: waits here while the queue is full
            self.queue.push(frame.freeze()).await?;
            self.stats.record_enqueued();

            tracing::debug!(
                session_id = session.id,
                queued = self.queue.len(),
                "Message enqueued"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::SinkExt;

    use super::*;
    use crate::envelope::{AuthAck, AuthRequest};
    use crate::session::ConnectionRole;
    use crate::transport::{FramedWriter, DEFAULT_MAX_FRAME_SIZE};

    fn gateway(queue: Arc<MessageQueue>, stats: Arc<BrokerStats>) -> IngestGateway {
        IngestGateway::new(queue, stats, &BrokerConfig::default())
    }

    fn session(id: u64) -> SessionState {
        SessionState::new(id, "127.0.0.1:0".parse().unwrap(), ConnectionRole::Producer)
    }

    async fn authed_client(
        gateway: Arc<IngestGateway>,
    ) -> (
        FramedReader<tokio::io::DuplexStream>,
        FramedWriter<tokio::io::DuplexStream>,
    ) {
        let (client, server) = tokio::io::duplex(4096);
        tokio::spawn(async move { gateway.handle_connection(session(1), server).await });

        let (mut reader, mut writer) = framed_split(client, DEFAULT_MAX_FRAME_SIZE);
        writer
            .send(AuthRequest::new("hello", "test").encode().unwrap())
            .await
            .unwrap();
        let ack = AuthAck::decode(&reader.next().await.unwrap().unwrap()).unwrap();
        assert!(ack.ok);
        (reader, writer)
    }

    #[tokio::test]
    async fn test_frames_are_enqueued_unmodified() {
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(BrokerStats::new());
        let gateway = Arc::new(gateway(Arc::clone(&queue), Arc::clone(&stats)));

        let (_reader, mut writer) = authed_client(gateway).await;
        writer.send(Bytes::from_static(b"payload-1")).await.unwrap();
        writer.send(Bytes::from_static(b"payload-2")).await.unwrap();

        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"payload-1"));
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"payload-2"));
        assert_eq!(stats.snapshot().enqueued, 2);
    }

    #[tokio::test]
    async fn test_bad_credentials_touch_nothing() {
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(BrokerStats::new());
        let gateway = Arc::new(gateway(Arc::clone(&queue), Arc::clone(&stats)));

        let (client, server) = tokio::io::duplex(4096);
        let handler =
            tokio::spawn(async move { gateway.handle_connection(session(1), server).await });

        let (mut reader, mut writer) = framed_split(client, DEFAULT_MAX_FRAME_SIZE);
        writer
            .send(AuthRequest::new("hello", "wrong").encode().unwrap())
            .await
            .unwrap();

        assert!(matches!(
            handler.await.unwrap(),
            Err(Error::AuthenticationFailed)
        ));
        // Rejected without an ack: the connection just ends
        assert!(reader.next().await.is_none());
        assert!(queue.is_empty());
        assert_eq!(stats.snapshot().enqueued, 0);
        assert_eq!(stats.snapshot().auth_failures, 1);
    }

    #[tokio::test]
    async fn test_disconnect_leaves_queue_intact() {
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(BrokerStats::new());
        let gateway = Arc::new(gateway(Arc::clone(&queue), Arc::clone(&stats)));

        let (reader, mut writer) = authed_client(gateway).await;
        writer.send(Bytes::from_static(b"kept")).await.unwrap();
        drop(writer);
        drop(reader);

        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"kept"));
    }

    #[tokio::test]
    async fn test_one_producer_failure_isolated() {
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(BrokerStats::new());
        let gateway = Arc::new(gateway(Arc::clone(&queue), Arc::clone(&stats)));

        let (reader_a, mut writer_a) = authed_client(Arc::clone(&gateway)).await;
        let (_reader_b, mut writer_b) = authed_client(gateway).await;

        writer_a.send(Bytes::from_static(b"from-a")).await.unwrap();
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"from-a"));
        drop(writer_a);
        drop(reader_a);

        // Producer B keeps working after A is gone
        writer_b.send(Bytes::from_static(b"from-b")).await.unwrap();
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"from-b"));
    }
}
