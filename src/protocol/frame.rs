use bytes::{Buf, BufMut};
use serde_json::Error as SerdeError;
use snafu::prelude::*;

use crate::protocol::data::Protocol;

/// Largest payload a peer may announce.
pub const MAX_FRAME_LENGTH: u64 = 1024 * 1024;

/// A wrapper of [`Protocol`] for converting the internal data from and to
/// bytes and being transmitted through byte stream.
///
/// The layout of a [`Frame`] in bytes is described below:
/// - starts with a `b'+'` and a big-endian `u64` as inner data's length,
/// - followed by JSON data of the length mentioned above, at most
///   [`MAX_FRAME_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Protocol,
}

impl Frame {
    /// Parse a [`Frame`] from one of buf's prefix and advance buf's cursor.
    /// Return a [`Frame`] and the offset from the initial position.
    ///
    /// Note that the cursor could be advanced even if it fails to parse a
    /// [`Frame`], its final position is expected to be valid only when it
    /// succeeds.
    ///
    /// # Errors
    ///
    /// This function will return an error if there is no enough byte or the
    /// data is broken.
    pub fn parse<B: Buf>(mut buf: B) -> Result<(Self, usize), ParseFrameError> {
        ensure!(buf.remaining() >= 1, IncompleteSnafu);
        ensure!(buf.get_u8() == b'+', InvalidStartSnafu);

        ensure!(buf.remaining() >= 8, IncompleteSnafu);
        let len = buf.get_u64();
        ensure!(len > 0, InvalidLengthSnafu);
        ensure!(len <= MAX_FRAME_LENGTH, TooLongSnafu { len });
        let len = len as usize;

        ensure!(buf.remaining() >= len, IncompleteSnafu);
        let reader = buf.take(len).reader();
        let data: Protocol = serde_json::from_reader(reader).context(DeserializationSnafu)?;

        Ok((data.into(), 9 + len))
    }

    /// Serialize a [`Frame`] and write it to buf.
    ///
    /// # Errors
    ///
    /// This function will return an error if the serialization fails or the
    /// payload is too long.
    pub fn write<B: BufMut>(&self, mut buf: B) -> Result<(), WriteFrameError> {
        let data = serde_json::to_string(&self.data).context(SerializationSnafu)?;
        let len = data.len() as u64;
        ensure!(len <= MAX_FRAME_LENGTH, OversizedSnafu { len });

        buf.put_u8(b'+');
        buf.put_u64(len);
        buf.put_slice(data.as_bytes());
        Ok(())
    }
}

impl From<Protocol> for Frame {
    fn from(value: Protocol) -> Self {
        Self { data: value }
    }
}

impl From<Frame> for Protocol {
    fn from(value: Frame) -> Self {
        value.data
    }
}

/// An error type for parsing a [`Frame`] from bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseFrameError {
    #[snafu(display("Could not parse a frame with incomplete data"))]
    Incomplete,
    #[snafu(display("Could not parse the start symbol"))]
    InvalidStart,
    #[snafu(display("The content length should be non-zero"))]
    InvalidLength,
    #[snafu(display("The content length {len} exceeds {MAX_FRAME_LENGTH}"))]
    TooLong { len: u64 },
    #[snafu(display("Could not deserialize data"))]
    Deserialization { source: SerdeError },
}

/// An error type for writing a [`Frame`] to bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteFrameError {
    #[snafu(display("Could not serialize frame"))]
    Serialization { source: SerdeError },
    #[snafu(display("Serialized frame of {len} bytes exceeds {MAX_FRAME_LENGTH}"))]
    Oversized { len: u64 },
}
