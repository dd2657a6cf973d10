//! Topic registry for pub/sub routing
//!
//! The registry maps each topic to the set of consumer connections currently
//! subscribed to it. The egress drain loop snapshots a topic's members and
//! fans the message out to each one; consumer control loops mutate the sets
//! as `sub`/`unsub` envelopes arrive.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<TopicRegistry>
//!                   ┌───────────────────────────┐
//!                   │ topics: HashMap<String,   │
//!                   │   HashMap<u64,            │
//!                   │     Subscriber {          │
//!                   │       outbound: mpsc::Tx, │
//!                   │     }                     │
//!                   │   >                       │
//!                   │ >                         │
//!                   └────────────┬──────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!       [Drain loop]        [Consumer]          [Consumer]
//!       snapshot_for()      control loop        control loop
//!            │              subscribe()         unsubscribe()
//!            └──► deliver() ──► outbound channel ──► writer task ──► TCP
//! ```
//!
//! A single `RwLock` guards the whole map-of-sets; fan-out volume in this
//! system is modest and critical sections are short map operations with no
//! I/O, so the coarse lock beats a per-topic locking scheme here. Delivery
//! itself happens outside the lock through each subscriber's bounded
//! outbound channel.
//!
//! Topic entries are created lazily on first subscribe and pruned as soon as
//! their member set becomes empty, so the map never outgrows the set of
//! topics with live subscribers.

pub mod error;
pub mod store;
pub mod subscriber;

pub use error::DeliveryError;
pub use store::TopicRegistry;
pub use subscriber::Subscriber;
