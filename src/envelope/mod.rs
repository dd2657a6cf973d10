//! Wire envelopes and the JSON codec
//!
//! Everything that crosses a connection is a length-delimited frame holding a
//! small JSON document. Two document kinds exist: the [`Envelope`] carried on
//! both the producer and consumer legs, and the authentication handshake pair
//! ([`AuthRequest`] / [`AuthAck`]) exchanged as the first frames of every
//! connection.
//!
//! The codec guarantees `decode(encode(x)) == x` and reports malformed input
//! as an error rather than panicking; the egress drain loop relies on that to
//! skip bad messages and keep going.

pub mod auth;
pub mod message;

pub use auth::{AuthAck, AuthRequest};
pub use message::{ControlVerb, Envelope, CONTROL_SUBSCRIBE, CONTROL_UNSUBSCRIBE};
