//! Topic-routed message broker
//!
//! A minimal broker reachable over authenticated, encrypted, persistent
//! connections. Producers publish opaque payloads tagged with a topic;
//! consumers declare interest in topics and receive only messages matching
//! their current subscription set.
//!
//! # Pipeline
//!
//! ```text
//!  Producer ──► Ingestion Gateway ──► Queue ──► Egress Gateway ──► Consumer(s)
//!                (authenticate,      (bounded    (drain, decode,
//!                 read, enqueue)      FIFO)       registry lookup,
//!                                                 fan-out)
//!                                                     ▲
//!  Consumer ──── sub/unsub control envelopes ─────────┘
//! ```
//!
//! The queue decouples producer rate from delivery rate and applies
//! backpressure once full; the registry tracks which connections are
//! subscribed to which topics under concurrent churn. Delivery is
//! best-effort: messages with no subscribers are discarded, and there is no
//! acknowledgement or redelivery. Within a single topic, messages arrive in
//! publish order.
//!
//! # Server example
//! ```no_run
//! use broker_rs::{Broker, BrokerConfig};
//! use broker_rs::transport::TlsServerConfig;
//!
//! # async fn example() -> broker_rs::error::Result<()> {
//! let tls = TlsServerConfig::from_pem_files("server.crt", "server.key")?;
//! let broker = Broker::new(BrokerConfig::default(), tls);
//! broker.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Clients live in the [`client`] module; see [`client::Producer`] and
//! [`client::Consumer`].

pub mod client;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;
pub mod transport;

pub use envelope::Envelope;
pub use error::{Error, Result};
pub use server::{Broker, BrokerConfig, Credentials};
