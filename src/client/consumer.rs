//! Consumer client
//!
//! Manages a subscription set on the broker's egress gateway and receives
//! the resulting fan-out.

use futures::{SinkExt, StreamExt};

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::transport::{FramedReader, FramedWriter, TlsClientConfig};

use super::config::ClientConfig;
use super::connect::{self, ClientStream};

/// Message consumer
///
/// Connects to the egress accept point, declares interest with
/// [`subscribe`](Consumer::subscribe) / [`unsubscribe`](Consumer::unsubscribe),
/// and receives matching messages with [`recv`](Consumer::recv). Delivery is
/// best-effort: a consumer that stops calling `recv` long enough for the
/// broker's per-connection buffer to fill will miss the overflow.
///
/// # Example
/// ```no_run
/// use broker_rs::client::{ClientConfig, Consumer};
/// use broker_rs::transport::TlsClientConfig;
///
/// # async fn example() -> broker_rs::error::Result<()> {
/// let tls = TlsClientConfig::from_ca_pem_file("ca.crt")?;
/// let config = ClientConfig::new("localhost:8082");
///
/// let mut consumer = Consumer::connect(&config, &tls).await?;
/// consumer.subscribe("news").await?;
/// while let Some(envelope) = consumer.recv().await? {
///     println!("{}", envelope);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Consumer {
    reader: FramedReader<ClientStream>,
    writer: FramedWriter<ClientStream>,
}

impl Consumer {
    /// Connect to the broker's egress accept point and authenticate
    pub async fn connect(config: &ClientConfig, tls: &TlsClientConfig) -> Result<Self> {
        let (reader, writer) = connect::connect(config, tls).await?;
        Ok(Self { reader, writer })
    }

    /// Subscribe this connection to `topic`
    ///
    /// Idempotent: subscribing twice has the same effect as once.
    pub async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.send_control(Envelope::subscribe(topic)).await
    }

    /// Unsubscribe this connection from `topic`
    ///
    /// A no-op if not subscribed.
    pub async fn unsubscribe(&mut self, topic: &str) -> Result<()> {
        self.send_control(Envelope::unsubscribe(topic)).await
    }

    /// Receive the next delivered envelope
    ///
    /// Returns `None` when the broker closes the connection.
    pub async fn recv(&mut self) -> Result<Option<Envelope>> {
        match self.reader.next().await {
            None => Ok(None),
            Some(Err(e)) => Err(Error::Io(e)),
            Some(Ok(frame)) => Ok(Some(Envelope::decode(&frame)?)),
        }
    }

    async fn send_control(&mut self, envelope: Envelope) -> Result<()> {
        self.writer.send(envelope.encode()?).await?;
        Ok(())
    }
}
