//! Egress gateway
//!
//! Two concurrent roles sharing the registry: the single drain loop that pops
//! envelopes off the queue and fans them out by topic, and one control loop
//! per consumer connection applying `sub`/`unsub` envelopes. Fan-out never
//! writes a socket directly: each delivery is dispatched into the target
//! connection's bounded outbound channel and a per-connection writer task
//! does the actual I/O, so one slow or dead consumer only hurts itself.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::envelope::{ControlVerb, Envelope};
use crate::error::{Error, Result};
use crate::gateway::handshake;
use crate::queue::MessageQueue;
use crate::registry::{DeliveryError, Subscriber, TopicRegistry};
use crate::server::{BrokerConfig, Credentials};
use crate::session::SessionState;
use crate::stats::BrokerStats;
use crate::transport::{framed_split, FramedReader};

/// Consumer-side gateway: queue drain plus subscription control
pub struct EgressGateway {
    queue: Arc<MessageQueue>,
    registry: Arc<TopicRegistry>,
    stats: Arc<BrokerStats>,
    credentials: Credentials,
    auth_deadline: Duration,
    max_frame_size: usize,
    subscriber_buffer: usize,
}

impl EgressGateway {
    /// Create the gateway over the shared queue and registry
    pub fn new(
        queue: Arc<MessageQueue>,
        registry: Arc<TopicRegistry>,
        stats: Arc<BrokerStats>,
        config: &BrokerConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            stats,
            credentials: config.credentials.clone(),
            auth_deadline: config.auth_deadline,
            max_frame_size: config.max_frame_size,
            subscriber_buffer: config.subscriber_buffer,
        }
    }

    /// Drain the queue for the lifetime of the broker
    ///
    /// The broker runs exactly one of these. A malformed envelope is
    /// discarded and logged; the loop itself never terminates on bad input.
    pub async fn run_drain_loop(&self) {
        while let Some(payload) = self.queue.pop().await {
            self.route(payload).await;
        }
        tracing::debug!("Drain loop stopped");
    }

    /// Route one raw envelope to the current subscribers of its topic
    async fn route(&self, payload: Bytes) {
        let envelope = match Envelope::decode(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.stats.record_decode_error();
                tracing::warn!(error = %e, "Discarding malformed envelope");
                return;
            }
        };

        let subscribers = self.registry.snapshot_for(&envelope.topic).await;
        if subscribers.is_empty() {
            self.stats.record_dropped_no_subscriber();
            tracing::debug!(topic = %envelope.topic, "No subscribers, discarding");
            return;
        }

        let mut dead = Vec::new();
        for subscriber in &subscribers {
            match subscriber.deliver(payload.clone()) {
                Ok(()) => self.stats.record_delivered(),
                Err(DeliveryError::Lagged) => {
                    self.stats.record_dropped_lagged();
                    tracing::warn!(
                        topic = %envelope.topic,
                        session_id = subscriber.id(),
                        "Subscriber lagging, message dropped"
                    );
                }
                Err(DeliveryError::Closed) => dead.push(subscriber.id()),
            }
        }

        // Writes to a closed channel mean the connection is gone; purge it
        // from every topic so dead subscribers do not accumulate
        for session_id in dead {
            tracing::debug!(session_id, "Removing dead subscriber");
            self.registry.remove_connection(session_id).await;
        }
    }

    /// Drive one consumer connection to completion
    ///
    /// Authenticates, then applies control envelopes to the registry until
    /// the connection ends. Always removes the connection from every topic
    /// set on the way out, whatever the reason for termination.
    pub async fn handle_consumer<S>(&self, mut session: SessionState, stream: S) -> Result<()>
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
                    "Consumer rejected: invalid credentials"
                );
            }
            session.close();
            return Err(e);
        }
        session.authenticate();
        self.stats.consumer_connected();
        tracing::debug!(session_id = session.id, peer = %session.peer_addr, "Consumer authenticated");

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Bytes>(self.subscriber_buffer);
        let subscriber = Subscriber::new(session.id, outbound_tx);

        // Writer task: drains the outbound channel onto the socket so the
        // drain loop's dispatch never blocks on this connection's transport
        let writer_task = tokio::spawn(async move {
            while let Some(payload) = outbound_rx.recv().await {
                if writer.send(payload).await.is_err() {
                    break;
                }
            }
        });

        let result = self.control_loop(&mut session, &mut reader, &subscriber).await;

        self.registry.remove_connection(session.id).await;
        writer_task.abort();
        self.stats.consumer_disconnected();
        session.close();
        tracing::debug!(
            session_id = session.id,
            frames = session.frames_in,
            duration_ms = session.duration().as_millis() as u64,
            "Consumer disconnected"
        );
        result
    }

    async fn control_loop<S>(
        &self,
        session: &mut SessionState,
        reader: &mut FramedReader<S>,
        subscriber: &Subscriber,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        while let Some(frame) = reader.next().await {
            let frame = frame?;
            session.on_frame();

            let envelope = Envelope::decode(&frame)?;
            match envelope.control_verb() {
                Some(ControlVerb::Subscribe) => {
                    self.registry
                        .subscribe(&envelope.topic, subscriber.clone())
                        .await;
                }
                Some(ControlVerb::Unsubscribe) => {
                    self.registry
                        .unsubscribe(&envelope.topic, subscriber.id())
                        .await;
                }
                None => {
                    tracing::warn!(
                        session_id = session.id,
                        envelope = %envelope,
                        "Ignoring invalid control message"
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;

    use super::*;
    use crate::envelope::{AuthAck, AuthRequest};
    use crate::session::ConnectionRole;
    use crate::transport::{FramedWriter, DEFAULT_MAX_FRAME_SIZE};

    struct Fixture {
        queue: Arc<MessageQueue>,
        registry: Arc<TopicRegistry>,
        stats: Arc<BrokerStats>,
        gateway: Arc<EgressGateway>,
    }

    fn fixture() -> Fixture {
        let queue = Arc::new(MessageQueue::new());
        let registry = Arc::new(TopicRegistry::new());
        let stats = Arc::new(BrokerStats::new());
        let gateway = Arc::new(EgressGateway::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::clone(&stats),
            &BrokerConfig::default(),
        ));

        Fixture {
            queue,
            registry,
            stats,
            gateway,
        }
    }

    fn session(id: u64) -> SessionState {
        SessionState::new(id, "127.0.0.1:0".parse().unwrap(), ConnectionRole::Consumer)
    }

    fn spawn_drain(fixture: &Fixture) {
        let gateway = Arc::clone(&fixture.gateway);
        tokio::spawn(async move { gateway.run_drain_loop().await });
    }

    async fn authed_consumer(
        fixture: &Fixture,
        id: u64,
    ) -> (
        FramedReader<tokio::io::DuplexStream>,
        FramedWriter<tokio::io::DuplexStream>,
    ) {
        let gateway = Arc::clone(&fixture.gateway);
        let (client, server) = tokio::io::duplex(4096);
        tokio::spawn(async move { gateway.handle_consumer(session(id), server).await });

        let (mut reader, mut writer) = framed_split(client, DEFAULT_MAX_FRAME_SIZE);
        writer
            .send(AuthRequest::new("hello", "test").encode().unwrap())
            .await
            .unwrap();
        let ack = AuthAck::decode(&reader.next().await.unwrap().unwrap()).unwrap();
        assert!(ack.ok);
        (reader, writer)
    }

    async fn wait_for_count(registry: &TopicRegistry, topic: &str, count: usize) {
        for _ in 0..200 {
            if registry.subscriber_count(topic).await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "timed out waiting for {} subscribers on {:?}",
            count, topic
        );
    }

    async fn recv_envelope(
        reader: &mut FramedReader<tokio::io::DuplexStream>,
    ) -> Option<Envelope> {
        let frame = tokio::time::timeout(Duration::from_secs(2), reader.next())
            .await
            .ok()??
            .ok()?;
        Envelope::decode(&frame).ok()
    }

    #[tokio::test]
    async fn test_subscribe_then_receive() {
        let fixture = fixture();
        spawn_drain(&fixture);

        let (mut reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;

        let published = Envelope::new("news", "hello");
        fixture.queue.push(published.encode().unwrap()).await.unwrap();

        assert_eq!(recv_envelope(&mut reader).await.unwrap(), published);
        assert_eq!(fixture.stats.snapshot().delivered, 1);
    }

    #[tokio::test]
    async fn test_never_subscribed_receives_nothing() {
        let fixture = fixture();
        spawn_drain(&fixture);

        let (mut reader_a, mut writer_a) = authed_consumer(&fixture, 1).await;
        let (mut reader_b, _writer_b) = authed_consumer(&fixture, 2).await;

        writer_a
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;

        fixture
            .queue
            .push(Envelope::new("news", "x").encode().unwrap())
            .await
            .unwrap();

        assert!(recv_envelope(&mut reader_a).await.is_some());
        assert!(
            tokio::time::timeout(Duration::from_millis(200), reader_b.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let fixture = fixture();
        spawn_drain(&fixture);

        let (mut reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;

        fixture
            .queue
            .push(Envelope::new("news", "first").encode().unwrap())
            .await
            .unwrap();
        assert_eq!(recv_envelope(&mut reader).await.unwrap().content, "first");

        writer
            .send(Envelope::unsubscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 0).await;

        fixture
            .queue
            .push(Envelope::new("news", "second").encode().unwrap())
            .await
            .unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(200), reader.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unknown_verb_does_not_kill_connection() {
        let fixture = fixture();

        let (_reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::new("news", "hello").encode().unwrap())
            .await
            .unwrap();

        // The control loop ignored the bogus verb and keeps serving
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;
    }

    #[tokio::test]
    async fn test_disconnect_cleans_up_all_subscriptions() {
        let fixture = fixture();

        let (reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        writer
            .send(Envelope::subscribe("sports").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;
        wait_for_count(&fixture.registry, "sports", 1).await;

        drop(reader);
        drop(writer);

        wait_for_count(&fixture.registry, "news", 0).await;
        wait_for_count(&fixture.registry, "sports", 0).await;
        assert_eq!(fixture.registry.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_envelope_skipped_by_drain() {
        let fixture = fixture();
        spawn_drain(&fixture);

        let (mut reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 1).await;

        fixture
            .queue
            .push(Bytes::from_static(b"garbage"))
            .await
            .unwrap();
        let valid = Envelope::new("news", "still alive");
        fixture.queue.push(valid.encode().unwrap()).await.unwrap();

        // The drain loop discarded the garbage and kept going
        assert_eq!(recv_envelope(&mut reader).await.unwrap(), valid);
        assert_eq!(fixture.stats.snapshot().decode_errors, 1);
    }

    #[tokio::test]
    async fn test_no_subscribers_discards_silently() {
        let fixture = fixture();
        spawn_drain(&fixture);

        fixture
            .queue
            .push(Envelope::new("nobody", "x").encode().unwrap())
            .await
            .unwrap();

        for _ in 0..200 {
            if fixture.stats.snapshot().dropped_no_subscriber == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("message was not discarded");
    }

    #[tokio::test]
    async fn test_dead_subscriber_does_not_block_live_one() {
        let fixture = fixture();
        spawn_drain(&fixture);

        // Dead member inserted directly: its outbound channel is already gone
        let (dead_tx, dead_rx) = mpsc::channel(1);
        drop(dead_rx);
        fixture
            .registry
            .subscribe("news", Subscriber::new(99, dead_tx))
            .await;

        let (mut reader, mut writer) = authed_consumer(&fixture, 1).await;
        writer
            .send(Envelope::subscribe("news").encode().unwrap())
            .await
            .unwrap();
        wait_for_count(&fixture.registry, "news", 2).await;

        let published = Envelope::new("news", "hello");
        fixture.queue.push(published.encode().unwrap()).await.unwrap();

        // The live subscriber still gets the message, and the dead one is
        // purged from the registry
        assert_eq!(recv_envelope(&mut reader).await.unwrap(), published);
        for _ in 0..200 {
            if !fixture.registry.is_subscribed("news", 99).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!fixture.registry.is_subscribed("news", 99).await);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_drops_only_overflow() {
        let fixture = fixture();
        spawn_drain(&fixture);

        // A subscriber with a single-slot channel that nobody drains
        let (tx, mut rx) = mpsc::channel(1);
        fixture.registry.subscribe("news", Subscriber::new(7, tx)).await;

        fixture
            .queue
            .push(Envelope::new("news", "first").encode().unwrap())
            .await
            .unwrap();
        fixture
            .queue
            .push(Envelope::new("news", "second").encode().unwrap())
            .await
            .unwrap();

        for _ in 0..200 {
            let snapshot = fixture.stats.snapshot();
            if snapshot.delivered == 1 && snapshot.dropped_lagged == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let snapshot = fixture.stats.snapshot();
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.dropped_lagged, 1);

        // The first message is intact; the overflow was dropped, the
        // subscription survives
        let frame = rx.recv().await.unwrap();
        assert_eq!(Envelope::decode(&frame).unwrap().content, "first");
        assert!(fixture.registry.is_subscribed("news", 7).await);
    }
}
