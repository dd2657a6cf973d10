//! Length-delimited message framing
//!
//! Both gateways and both clients speak whole frames: a 4-byte big-endian
//! length prefix followed by the payload. Frames above the configured size
//! bound fail the read with an I/O error, which the owning connection loop
//! treats like any other transport failure, isolated to that connection.

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Default upper bound on a single frame's payload
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame-decoding read half of a connection
pub type FramedReader<S> = FramedRead<ReadHalf<S>, LengthDelimitedCodec>;

/// Frame-encoding write half of a connection
pub type FramedWriter<S> = FramedWrite<WriteHalf<S>, LengthDelimitedCodec>;

/// Split a connected stream into framed read and write halves
pub fn framed_split<S>(stream: S, max_frame_size: usize) -> (FramedReader<S>, FramedWriter<S>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read_half, write_half) = tokio::io::split(stream);

    (
        FramedRead::new(read_half, codec(max_frame_size)),
        FramedWrite::new(write_half, codec(max_frame_size)),
    )
}

fn codec(max_frame_size: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_size)
        .new_codec()
}
