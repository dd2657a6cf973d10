//! Broker-wide counters
//!
//! Shared by the gateways and the drain loop; readable at any time through
//! [`BrokerStats::snapshot`]. Delivery in this system is best-effort, so the
//! dropped counters are the only record of messages that went nowhere.

use std::sync::atomic::{AtomicU64, Ordering};

/// Broker-wide statistics, updated lock-free from every task
#[derive(Debug, Default)]
pub struct BrokerStats {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    dropped_no_subscriber: AtomicU64,
    dropped_lagged: AtomicU64,
    decode_errors: AtomicU64,
    auth_failures: AtomicU64,
    active_consumers: AtomicU64,
}

/// Point-in-time copy of the broker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Messages accepted into the queue
    pub enqueued: u64,
    /// Per-subscriber deliveries dispatched by the drain loop
    pub delivered: u64,
    /// Messages discarded because their topic had no subscribers
    pub dropped_no_subscriber: u64,
    /// Per-subscriber deliveries dropped because the consumer lagged
    pub dropped_lagged: u64,
    /// Malformed envelopes discarded by the drain loop
    pub decode_errors: u64,
    /// Connections rejected by the credential handshake
    pub auth_failures: u64,
    /// Consumer connections currently live
    pub active_consumers: u64,
}

impl BrokerStats {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message accepted into the queue
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one successful per-subscriber dispatch
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message discarded for lack of subscribers
    pub fn record_dropped_no_subscriber(&self) {
        self.dropped_no_subscriber.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a per-subscriber drop caused by a lagging consumer
    pub fn record_dropped_lagged(&self) {
        self.dropped_lagged.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed envelope discarded at egress
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected credential handshake
    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a consumer connection entering service
    pub fn consumer_connected(&self) {
        self.active_consumers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a consumer connection leaving service
    pub fn consumer_disconnected(&self) {
        self.active_consumers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_no_subscriber: self.dropped_no_subscriber.load(Ordering::Relaxed),
            dropped_lagged: self.dropped_lagged.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            active_consumers: self.active_consumers.load(Ordering::Relaxed),
        }
    }
}
