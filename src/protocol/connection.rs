use std::io::Error as IoError;

use bytes::{Buf, BytesMut};
use snafu::prelude::*;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::frame::{Frame, ParseFrameError, WriteFrameError};

/// A wrapper of a stream (typically a socket), which handles sending and
/// receiving frames through the stream.
pub struct Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream: S,
    buffer: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Serialize a [`Frame`] to bytes and send it through the wrapped stream.
    ///
    /// # Errors
    ///
    /// This function will return an error if serialization fails or network
    /// IO fails.
    pub async fn send(&mut self, frame: Frame) -> Result<(), SendFrameError> {
        let mut buffer = BytesMut::with_capacity(256);
        frame.write(&mut buffer).context(WriteSnafuS)?;

        self.stream
            .write_all(&buffer)
            .await
            .context(NetworkSnafuS)?;
        self.stream.flush().await.context(NetworkSnafuS)?;

        Ok(())
    }

    /// Receive bytes from the wrapped stream and then deserialize the
    /// [`Frame`].
    ///
    /// This method is cancel safe: bytes read before cancellation stay
    /// buffered for the next call.
    ///
    /// # Errors
    ///
    /// This function will return an error if deserialization fails or network
    /// IO fails.
    pub async fn receive(&mut self) -> Result<Frame, ReceiveFrameError> {
        loop {
            match Frame::parse(&self.buffer[..]) {
                Ok((frame, offset)) => {
                    self.buffer.advance(offset);
                    return Ok(frame);
                }
                Err(ParseFrameError::Incomplete) => {}
                Err(err) => return Err(err).context(ParseSnafuR),
            }

            match self.stream.read_buf(&mut self.buffer).await {
                Ok(0) => return ClosedSnafuR.fail(),
                Err(err) => return Err(err).context(NetworkSnafuR),
                _ => {}
            }
        }
    }
}

impl<S> From<S> for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from(value: S) -> Self {
        Self {
            stream: value,
            buffer: BytesMut::with_capacity(1024),
        }
    }
}

/// An error type for sending a [`Frame`].
#[derive(Debug, Snafu)]
#[snafu(context(suffix(SnafuS)))]
#[non_exhaustive]
pub enum SendFrameError {
    #[snafu(display("Could not write frame to buffer"))]
    Write { source: WriteFrameError },
    #[snafu(display("Could not send bytes through inner stream"))]
    Network { source: IoError },
}

/// An error type for receiving a [`Frame`].
#[derive(Debug, Snafu)]
#[snafu(context(suffix(SnafuR)))]
#[non_exhaustive]
pub enum ReceiveFrameError {
    #[snafu(display("Could not parse frame from buffer"))]
    Parse { source: ParseFrameError },
    #[snafu(display("Connection is closed by the peer"))]
    Closed,
    #[snafu(display("Could not receive bytes through inner stream"))]
    Network { source: IoError },
}
