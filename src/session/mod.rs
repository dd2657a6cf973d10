//! Per-connection session state
//!
//! Tracks one connection's lifecycle from accept to close: which gateway owns
//! it, whether the credential handshake has completed, and basic traffic
//! counters for the close log line.

pub mod state;

pub use state::{ConnectionRole, SessionPhase, SessionState};
