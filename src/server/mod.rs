//! Broker server
//!
//! The [`Broker`] owns one queue, one registry, and one stats block, binds
//! the two accept points (ingest for producers, egress for consumers), and
//! spawns a handler task per accepted connection plus the single drain task.
//! Everything is dependency-injected at construction, so a test process can
//! run any number of isolated brokers side by side.

pub mod auth;
pub mod broker;
pub mod config;

pub use auth::Credentials;
pub use broker::Broker;
pub use config::BrokerConfig;
