//! Topic registry implementation
//!
//! The central registry that tracks which consumer connections are
//! subscribed to which topics, under concurrent subscribe/unsubscribe churn
//! from the consumer control loops and snapshot reads from the drain loop.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::subscriber::Subscriber;

/// Concurrency-safe mapping from topic name to subscriber set
///
/// Thread-safe via a single `RwLock` over the whole map-of-sets, the
/// reference coarse-lock design. Mutations and snapshots are short critical
/// sections that never perform I/O while holding the lock; a snapshot taken
/// just before an unsubscribe may still receive one extra message, which is
/// accepted best-effort behavior.
pub struct TopicRegistry {
    /// Map of topic name to the connections subscribed to it
    topics: RwLock<HashMap<String, HashMap<u64, Subscriber>>>,
}

impl TopicRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Idempotently add a subscriber to a topic's set
    ///
    /// The topic entry is created lazily on first reference. Subscribing
    /// twice with the same session id has the same effect as once.
    pub async fn subscribe(&self, topic: &str, subscriber: Subscriber) {
        let session_id = subscriber.id();
        let mut topics = self.topics.write().await;
        let members = topics.entry(topic.to_string()).or_default();

        if members.insert(session_id, subscriber).is_none() {
            tracing::info!(
                topic = %topic,
                session_id,
                subscribers = members.len(),
                "Subscriber added"
            );
        }
    }

    /// Idempotently remove a subscriber from a topic's set
    ///
    /// A no-op for unknown topics and non-members. A topic entry whose set
    /// becomes empty is pruned immediately.
    pub async fn unsubscribe(&self, topic: &str, session_id: u64) {
        let mut topics = self.topics.write().await;

        if let Some(members) = topics.get_mut(topic) {
            if members.remove(&session_id).is_some() {
                tracing::info!(
                    topic = %topic,
                    session_id,
                    subscribers = members.len(),
                    "Subscriber removed"
                );
            }
            if members.is_empty() {
                topics.remove(topic);
            }
        }
    }

    /// Point-in-time snapshot of a topic's current members for delivery
    ///
    /// Returns an empty vector for unknown topics. Concurrent mutation
    /// after the snapshot is taken does not affect the returned handles.
    pub async fn snapshot_for(&self, topic: &str) -> Vec<Subscriber> {
        let topics = self.topics.read().await;

        topics
            .get(topic)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a connection from every topic set it belongs to
    ///
    /// Mandatory cleanup on consumer disconnect: a leaked membership would
    /// keep a dead connection receiving delivery attempts forever. Topic
    /// entries left empty are pruned.
    pub async fn remove_connection(&self, session_id: u64) {
        let mut topics = self.topics.write().await;

        topics.retain(|topic, members| {
            if members.remove(&session_id).is_some() {
                tracing::debug!(
                    topic = %topic,
                    session_id,
                    subscribers = members.len(),
                    "Subscription dropped on disconnect"
                );
            }
            !members.is_empty()
        });
    }

    /// Whether a connection is currently subscribed to a topic
    pub async fn is_subscribed(&self, topic: &str, session_id: u64) -> bool {
        let topics = self.topics.read().await;

        topics
            .get(topic)
            .is_some_and(|members| members.contains_key(&session_id))
    }

    /// Number of current members of a topic
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().await;
        topics.get(topic).map_or(0, HashMap::len)
    }

    /// Number of topics with at least one subscriber
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}
