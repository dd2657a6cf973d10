//! Topic-tagged message envelope

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Content verb that subscribes the sending connection to the envelope's topic
pub const CONTROL_SUBSCRIBE: &str = "sub";

/// Content verb that unsubscribes the sending connection from the envelope's topic
pub const CONTROL_UNSUBSCRIBE: &str = "unsub";

/// The unit of transport on both legs of the pipeline
///
/// Producers publish these tagged with a topic; consumers send them with a
/// control verb as content to mutate their subscription set, and receive them
/// verbatim on delivery. Field names on the wire are capitalized for
/// compatibility with the original protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic name; case-sensitive, never empty
    #[serde(rename = "Topic")]
    pub topic: String,

    /// Opaque payload, or a control verb on the consumer control leg
    #[serde(rename = "Content")]
    pub content: String,
}

/// Subscription mutation requested by a control envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlVerb {
    /// Add the connection to the topic's subscriber set
    Subscribe,
    /// Remove the connection from the topic's subscriber set
    Unsubscribe,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
        }
    }

    /// Create a subscribe control envelope for `topic`
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::new(topic, CONTROL_SUBSCRIBE)
    }

    /// Create an unsubscribe control envelope for `topic`
    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self::new(topic, CONTROL_UNSUBSCRIBE)
    }

    /// Serialize to wire bytes
    ///
    /// Fails on an empty topic; topics are non-empty by invariant.
    pub fn encode(&self) -> Result<Bytes> {
        if self.topic.is_empty() {
            return Err(Error::InvalidEnvelope("empty topic"));
        }
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Deserialize from wire bytes
    ///
    /// Malformed input is reported, never a panic.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.topic.is_empty() {
            return Err(Error::InvalidEnvelope("empty topic"));
        }
        Ok(envelope)
    }

    /// Interpret the content as a control verb
    ///
    /// Only the exact strings `"sub"` and `"unsub"` are control verbs; any
    /// other content is not recognized and the caller decides what to do
    /// (the egress gateway logs and ignores it).
    pub fn control_verb(&self) -> Option<ControlVerb> {
        match self.content.as_str() {
            CONTROL_SUBSCRIBE => Some(ControlVerb::Subscribe),
            CONTROL_UNSUBSCRIBE => Some(ControlVerb::Unsubscribe),
            _ => None,
        }
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.topic, self.content)
    }
}
