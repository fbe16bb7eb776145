pub mod connection;
mod data;
mod frame;

pub use connection::{Connection, ReceiveFrameError, SendFrameError};
pub use data::{Protocol, Request, Response};
pub use frame::{Frame, ParseFrameError, WriteFrameError, MAX_FRAME_LENGTH};
