//! Ingestion and egress gateways
//!
//! The two halves of the pipeline around the queue. The ingestion gateway
//! authenticates producers and forwards their frames into the queue; the
//! egress gateway drains the queue, routes each envelope by topic through the
//! registry, and runs the control loop that mutates subscriptions for each
//! consumer connection.
//!
//! Both gateways are generic over the connected stream so the broker can hand
//! them TLS sessions while tests drive them over in-memory duplex pipes.

pub mod egress;
pub(crate) mod handshake;
pub mod ingest;

pub use egress::EgressGateway;
pub use ingest::IngestGateway;
