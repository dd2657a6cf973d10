//! Bounded FIFO message queue
//!
//! The queue decouples producer rate from delivery rate and is the system's
//! only admission-control mechanism: once it holds `capacity` undelivered
//! messages, further pushes wait until the drain loop frees space. Payloads
//! are opaque bytes; topic interpretation happens downstream at egress, so
//! the queue is reusable for anything.

pub mod fifo;

pub use fifo::{MessageQueue, DEFAULT_QUEUE_CAPACITY};
