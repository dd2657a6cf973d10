//! Transport plumbing: TLS configuration and message framing
//!
//! The pipeline itself only consumes connected channels; everything here is
//! the thin collaborator layer that produces them. TLS termination uses
//! `rustls`, and messages are delimited on the wire with a length prefix via
//! `tokio_util`'s codec so that both gateways read and write whole frames.

pub mod framed;
pub mod tls;

pub use framed::{framed_split, FramedReader, FramedWriter, DEFAULT_MAX_FRAME_SIZE};
pub use tls::{TlsClientConfig, TlsServerConfig};
