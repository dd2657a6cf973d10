//! Bounded FIFO queue implementation

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Default number of outstanding messages the queue will hold
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Bounded, concurrency-safe FIFO queue of opaque message payloads
///
/// Backed by a bounded `mpsc` channel: any number of producer tasks push
/// concurrently, and `push` applies backpressure once the bound is reached.
/// The receiving half sits behind a `Mutex` so the structure stays safe if
/// more than one dequeuer is ever attached, although this design runs a
/// single drain loop. Strict FIFO order; payloads are never inspected,
/// reordered, or dropped.
pub struct MessageQueue {
    tx: mpsc::Sender<Bytes>,
    rx: Mutex<mpsc::Receiver<Bytes>>,
    capacity: usize,
}

impl MessageQueue {
    /// Create a queue with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a queue bounded at `capacity` outstanding messages (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
        }
    }

    /// Enqueue a payload, waiting while the queue is at capacity
    ///
    /// This is the backpressure point for producers: the call suspends until
    /// the drain loop frees a slot. Fails only if the queue has been closed.
    pub async fn push(&self, payload: Bytes) -> Result<()> {
        self.tx.send(payload).await.map_err(|_| Error::QueueClosed)
    }

    /// Enqueue a payload without waiting
    ///
    /// Returns [`Error::QueueFull`] when at capacity instead of blocking,
    /// the reject-policy variant of admission control.
    pub fn try_push(&self, payload: Bytes) -> Result<()> {
        match self.tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Error::QueueFull),
            Err(TrySendError::Closed(_)) => Err(Error::QueueClosed),
        }
    }

    /// Dequeue the oldest payload, waiting while the queue is empty
    ///
    /// Returns `None` only if the underlying channel closes; for a live
    /// queue this call simply waits until a producer pushes.
    pub async fn pop(&self) -> Option<Bytes> {
        self.rx.lock().await.recv().await
    }

    /// Number of messages currently queued
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MessageQueue::with_capacity(10);

        for i in 0..10u8 {
            queue.push(Bytes::from(vec![i])).await.unwrap();
        }

        for i in 0..10u8 {
            assert_eq!(queue.pop().await.unwrap(), Bytes::from(vec![i]));
        }
    }

    #[tokio::test]
    async fn test_push_blocks_at_capacity() {
        let queue = Arc::new(MessageQueue::with_capacity(2));

        queue.push(Bytes::from_static(b"a")).await.unwrap();
        queue.push(Bytes::from_static(b"b")).await.unwrap();
        assert_eq!(queue.len(), 2);

        // Third push must not complete until a slot frees up
        let blocked = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(Bytes::from_static(b"c")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        // Draining one message unblocks the producer, and nothing is lost
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"a"));
        blocked.await.unwrap().unwrap();
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"b"));
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"c"));
    }

    #[tokio::test]
    async fn test_try_push_rejects_when_full() {
        let queue = MessageQueue::with_capacity(1);

        queue.try_push(Bytes::from_static(b"a")).unwrap();
        assert!(matches!(
            queue.try_push(Bytes::from_static(b"b")),
            Err(Error::QueueFull)
        ));

        // The queued message is still intact
        assert_eq!(queue.pop().await.unwrap(), Bytes::from_static(b"a"));
        queue.try_push(Bytes::from_static(b"c")).unwrap();
    }

    #[tokio::test]
    async fn test_pop_blocks_until_push() {
        let queue = Arc::new(MessageQueue::with_capacity(4));

        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!popper.is_finished());

        queue.push(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(popper.await.unwrap().unwrap(), Bytes::from_static(b"x"));
    }

    #[tokio::test]
    async fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(MessageQueue::with_capacity(100));

        let mut handles = Vec::new();
        for p in 0..4u8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                for i in 0..25u8 {
                    queue.push(Bytes::from(vec![p, i])).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(queue.len(), 100);
        let mut received = Vec::new();
        for _ in 0..100 {
            received.push(queue.pop().await.unwrap());
        }

        // Per-producer order is preserved through the shared queue
        for p in 0..4u8 {
            let order: Vec<u8> = received
                .iter()
                .filter(|b| b[0] == p)
                .map(|b| b[1])
                .collect();
            assert_eq!(order, (0..25u8).collect::<Vec<_>>());
        }
    }
}
