//! Server-side credential handshake
//!
//! The first frame on every accepted connection must carry credentials. A
//! valid pair is acknowledged; anything else (wrong pair, malformed frame,
//! no frame within the deadline) fails the handshake and the caller closes
//! the connection without replying, before any gateway logic runs.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::envelope::{AuthAck, AuthRequest};
use crate::error::{Error, Result};
use crate::server::Credentials;
use crate::transport::{FramedReader, FramedWriter};

/// Run the credential handshake on a freshly accepted connection
pub(crate) async fn authenticate<S>(
    reader: &mut FramedReader<S>,
    writer: &mut FramedWriter<S>,
    credentials: &Credentials,
    deadline: Duration,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let frame = tokio::time::timeout(deadline, reader.next())
        .await
        .map_err(|_| Error::AuthenticationFailed)?
        .ok_or(Error::ConnectionClosed)??;

    let request = AuthRequest::decode(&frame).map_err(|_| Error::AuthenticationFailed)?;
    if !credentials.verify(&request) {
        return Err(Error::AuthenticationFailed);
    }

    writer.send(AuthAck::accepted().encode()?).await?;
    Ok(())
}
