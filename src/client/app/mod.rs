pub mod client;
pub mod command;
pub mod connector;

pub use client::{clock, Client, ClientError};
pub use command::{BlockCommand, Command, DurationArguments};
