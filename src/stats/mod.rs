//! Statistics and counters for the broker pipeline

pub mod metrics;

pub use metrics::{BrokerStats, StatsSnapshot};
