use serde_json::{Error as SerdeError, Value};
use snafu::prelude::*;
use tokio::sync::broadcast::Receiver;

use crate::domain::daemon::broadcast::TimerEvent;
use crate::domain::daemon::worker::WorkerGoneError;
use crate::domain::entity::{Mode, TimerState, TryNewModeDurationsError};
use crate::domain::repository::{StorageError, StorageKey};

/// A public port for driving the timer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TimerPort: Send + Sync + 'static {
    /// Get a snapshot of the timer.
    async fn get_state(&self) -> Result<TimerState, TimerError>;

    /// Start or resume the countdown.
    async fn start(&self) -> Result<(), TimerError>;

    /// Pause the countdown.
    async fn pause(&self) -> Result<(), TimerError>;

    /// Stop the countdown and restore the full duration.
    async fn reset(&self) -> Result<(), TimerError>;

    /// Switch to another mode, stopping the countdown.
    async fn change_mode(&self, mode: Mode) -> Result<(), TimerError>;

    /// Re-read the configured durations from the store and apply them.
    async fn reload_durations(&self) -> Result<(), TimerError>;
}

/// An error type of the timer operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum TimerError {
    #[snafu(display("Timer is not available"))]
    #[non_exhaustive]
    Gone { source: WorkerGoneError },
    #[snafu(display("Could not read configured durations"))]
    #[non_exhaustive]
    LoadDurations { source: StorageError },
    #[snafu(display("Configured durations are invalid"))]
    #[non_exhaustive]
    InvalidDurations { source: TryNewModeDurationsError },
}

/// A public port for listening to timer events.
#[cfg_attr(test, mockall::automock)]
pub trait SubscribePort: Send + Sync + 'static {
    /// Start receiving every event broadcast from now on.
    fn subscribe(&self) -> Receiver<TimerEvent>;
}

/// A public port for the view-owned preferences in the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferencePort: Send + Sync + 'static {
    /// Read the raw value under `key`.
    async fn read(&self, key: StorageKey) -> Result<Option<Value>, PreferenceError>;

    /// Validate and store `value` under `key`. The timer state can only be
    /// changed through [`TimerPort`].
    async fn write(&self, key: StorageKey, value: Value) -> Result<(), PreferenceError>;
}

/// An error type of the preference operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum PreferenceError {
    #[snafu(display("{key} is owned by the timer and cannot be written"))]
    #[non_exhaustive]
    ReadOnly { key: StorageKey },
    #[snafu(display("Invalid value for {key}"))]
    #[non_exhaustive]
    Invalid { key: StorageKey, source: SerdeError },
    #[snafu(display("Invalid value for {key}"))]
    #[non_exhaustive]
    ZeroDuration {
        key: StorageKey,
        source: TryNewModeDurationsError,
    },
    #[snafu(display("Could not access preferences"))]
    #[non_exhaustive]
    Storage { source: StorageError },
}

/// A public port for stopping the timer before the daemon exits.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShutdownPort: Send + Sync + 'static {
    /// Persist the final state and stop background tasks.
    async fn shutdown(&self);
}
