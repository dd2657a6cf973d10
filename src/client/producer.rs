//! Producer client
//!
//! Publishes topic-tagged messages to the broker's ingestion gateway.

use futures::SinkExt;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::transport::{FramedWriter, TlsClientConfig};

use super::config::ClientConfig;
use super::connect::{self, ClientStream};

/// Message producer
///
/// Connects to the ingestion accept point and publishes envelopes. The
/// broker applies backpressure by simply not draining the connection while
/// its queue is full, so `publish` may wait under load.
///
/// # Example
/// ```no_run
/// use broker_rs::client::{ClientConfig, Producer};
/// use broker_rs::transport::TlsClientConfig;
///
/// # async fn example() -> broker_rs::error::Result<()> {
/// let tls = TlsClientConfig::from_ca_pem_file("ca.crt")?;
/// let config = ClientConfig::new("localhost:8081");
///
/// let mut producer = Producer::connect(&config, &tls).await?;
/// producer.publish("news", "hello").await?;
/// # Ok(())
/// # }
/// ```
pub struct Producer {
    writer: FramedWriter<ClientStream>,
}

impl Producer {
    /// Connect to the broker's ingestion accept point and authenticate
    pub async fn connect(config: &ClientConfig, tls: &TlsClientConfig) -> Result<Self> {
        let (_reader, writer) = connect::connect(config, tls).await?;
        Ok(Self { writer })
    }

    /// Publish a message tagged with `topic`
    pub async fn publish(&mut self, topic: &str, content: &str) -> Result<()> {
        self.publish_envelope(&Envelope::new(topic, content)).await
    }

    /// Publish a pre-built envelope
    pub async fn publish_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        self.writer.send(envelope.encode()?).await?;
        Ok(())
    }
}
