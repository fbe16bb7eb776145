use std::error::Error as StdError;

use futures::stream::BoxStream;
use serde_json::Value;
use snafu::prelude::*;

use crate::domain::entity::{Mode, TimerState};
use crate::domain::repository::StorageKey;

/// A public port for requesting the daemon to drive the timer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TimerCommandPort: Send + Sync + 'static {
    /// Query the current timer state.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn get_state(&self) -> Result<TimerState, RequestDaemonError>;

    /// Start or resume the countdown. Returns the daemon's reply.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn start(&self) -> Result<String, RequestDaemonError>;

    /// Pause the countdown.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn pause(&self) -> Result<String, RequestDaemonError>;

    /// Reset the current session.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn reset(&self) -> Result<String, RequestDaemonError>;

    /// Switch to `mode`, stopping the countdown.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn change_mode(&self, mode: Mode) -> Result<String, RequestDaemonError>;

    /// Ask the daemon to re-read the configured durations.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn change_durations(&self) -> Result<String, RequestDaemonError>;
}

/// A public port for reading and writing the view-owned preferences.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceClientPort: Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the operation failed.
    async fn read(&self, key: StorageKey) -> Result<Option<Value>, RequestDaemonError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the daemon rejects the value.
    async fn write(&self, key: StorageKey, value: Value) -> Result<String, RequestDaemonError>;
}

/// Something a subscribed view is told by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The state when subscribing, or after any change.
    State(TimerState),
    SessionComplete(Mode),
}

pub type WatchStream = BoxStream<'static, Result<WatchEvent, RequestDaemonError>>;

/// A public port for following the timer as it changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchPort: Send + Sync + 'static {
    /// Subscribe to the daemon. The stream ends when the daemon goes away.
    ///
    /// # Errors
    ///
    /// This function will return an error if the subscription could not be
    /// established.
    async fn watch(&self) -> Result<WatchStream, RequestDaemonError>;
}

/// An error type of sending requests to daemon.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub))]
pub enum RequestDaemonError {
    #[snafu(display("Endpoint {endpoint} is unavailable"))]
    Unavailable { endpoint: String },
    #[snafu(display("Could not receive a valid response"))]
    BadResponse,
    #[snafu(display("Daemon refused the request: {reason}"))]
    Rejected { reason: String },
    #[snafu(whatever, display("Request failed: {message}"))]
    Unknown {
        message: String,
        #[snafu(source(from(Box<dyn StdError + Send + Sync>, Some)))]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}
