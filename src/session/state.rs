//! Session state machine
//!
//! Tracks the state of one connection from accept to disconnect. A connection
//! plays exactly one role for its whole lifetime, decided by which gateway
//! accepted it.

use std::net::SocketAddr;
use std::time::Instant;

/// Which side of the pipeline a connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    /// Accepted by the ingestion gateway; writes messages into the pipeline
    Producer,
    /// Accepted by the egress gateway; subscribes to topics and receives fan-out
    Consumer,
}

impl std::fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionRole::Producer => write!(f, "producer"),
            ConnectionRole::Consumer => write!(f, "consumer"),
        }
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Transport established, credential handshake not yet completed
    Connected,
    /// Handshake accepted; gateway read loop running
    Authenticated,
    /// Terminal: transport failed or peer disconnected
    Closed,
}

/// Complete per-connection state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session id issued at accept time
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Role assigned by the accepting gateway
    pub role: ConnectionRole,

    /// Current phase
    pub phase: SessionPhase,

    /// When the connection was accepted
    pub connected_at: Instant,

    /// When the credential handshake completed
    pub authenticated_at: Option<Instant>,

    /// Frames read from the peer
    pub frames_in: u64,
}

impl SessionState {
    /// Create state for a freshly accepted connection
    pub fn new(id: u64, peer_addr: SocketAddr, role: ConnectionRole) -> Self {
        Self {
            id,
            peer_addr,
            role,
            phase: SessionPhase::Connected,
            connected_at: Instant::now(),
            authenticated_at: None,
            frames_in: 0,
        }
    }

    /// Mark the credential handshake as completed
    pub fn authenticate(&mut self) {
        if self.phase == SessionPhase::Connected {
            self.phase = SessionPhase::Authenticated;
            self.authenticated_at = Some(Instant::now());
        }
    }

    /// Record one frame read from the peer
    pub fn on_frame(&mut self) {
        self.frames_in += 1;
    }

    /// Transition to the terminal phase
    ///
    /// Reachable from any state; the owning gateway performs registry
    /// cleanup alongside this transition for consumer sessions.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Whether the handshake has completed
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
