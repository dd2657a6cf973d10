//! Client-side connect and handshake
//!
//! Dials the broker, completes the TLS handshake, and presents credentials.
//! The broker acknowledges a valid pair; a rejected client sees its
//! connection closed instead of an ack, which surfaces here as
//! [`Error::AuthenticationFailed`].

use futures::{SinkExt, StreamExt};
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;

use crate::envelope::{AuthAck, AuthRequest};
use crate::error::{Error, Result};
use crate::transport::{framed_split, FramedReader, FramedWriter, TlsClientConfig};

use super::config::ClientConfig;

/// The client's side of a broker connection
pub(crate) type ClientStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Dial, handshake, and authenticate; returns the framed connection halves
pub(crate) async fn connect(
    config: &ClientConfig,
    tls: &TlsClientConfig,
) -> Result<(FramedReader<ClientStream>, FramedWriter<ClientStream>)> {
    let socket = TcpStream::connect(&config.addr).await?;
    let server_name = ServerName::try_from(config.server_name.clone())
        .map_err(|e| Error::Tls(format!("invalid server name: {e}")))?;
    let stream = tls.connector().connect(server_name, socket).await?;

    let (mut reader, mut writer) = framed_split(stream, config.max_frame_size);

    let request = AuthRequest::new(
        config.credentials.username(),
        config.credentials.password(),
    );
    writer.send(request.encode()?).await?;

    // The broker closes rejected connections without replying, so anything
    // other than an ack frame here means the credentials did not pass
    let frame = match reader.next().await {
        Some(Ok(frame)) => frame,
        Some(Err(_)) | None => return Err(Error::AuthenticationFailed),
    };
    let ack = AuthAck::decode(&frame).map_err(|_| Error::AuthenticationFailed)?;
    if !ack.ok {
        return Err(Error::AuthenticationFailed);
    }

    tracing::debug!(addr = %config.addr, "Connected and authenticated");
    Ok((reader, writer))
}
