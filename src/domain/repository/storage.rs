use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Error as SerdeError, Value};
use snafu::prelude::*;
use tokio::sync::broadcast::Receiver;

/// Keys of the persistent key-value store shared by the daemon and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    #[serde(rename = "timerState")]
    TimerState,
    #[serde(rename = "durations")]
    Durations,
    #[serde(rename = "blockedSites")]
    BlockedSites,
    #[serde(rename = "selectedMode")]
    SelectedMode,
    #[serde(rename = "theme")]
    Theme,
    #[serde(rename = "blockNotifications")]
    BlockNotifications,
}

impl StorageKey {
    pub const ALL: [StorageKey; 6] = [
        StorageKey::TimerState,
        StorageKey::Durations,
        StorageKey::BlockedSites,
        StorageKey::SelectedMode,
        StorageKey::Theme,
        StorageKey::BlockNotifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimerState => "timerState",
            Self::Durations => "durations",
            Self::BlockedSites => "blockedSites",
            Self::SelectedMode => "selectedMode",
            Self::Theme => "theme",
            Self::BlockNotifications => "blockNotifications",
        }
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKey {
    type Err = ParseStorageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .context(UnknownKeySnafu { key: s })
    }
}

/// An error type of parsing a [`StorageKey`].
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseStorageKeyError {
    #[snafu(display("Unknown storage key {key:?}"))]
    #[non_exhaustive]
    UnknownKey { key: String },
}

/// A notification that some key's value was replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: StorageKey,
    pub new_value: Value,
}

/// An abstract interface for the persistent key-value store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StorageRepository: Send + Sync + 'static {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the store could not be read.
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the store could not be written.
    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StorageError>;

    /// Subscribe to changes of any key, including those made by other
    /// writers.
    fn subscribe(&self) -> Receiver<StorageChange>;
}

/// Read and decode the value under `key`.
///
/// # Errors
///
/// This function will return an error if reading fails or the stored value
/// has an unexpected shape.
pub async fn load<T: DeserializeOwned>(
    repository: &dyn StorageRepository,
    key: StorageKey,
) -> Result<Option<T>, StorageError> {
    match repository.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .context(DecodeSnafu { key }),
        None => Ok(None),
    }
}

/// Encode and store `value` under `key`.
///
/// # Errors
///
/// This function will return an error if encoding or writing fails.
pub async fn store<T: Serialize + ?Sized>(
    repository: &dyn StorageRepository,
    key: StorageKey,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value).context(EncodeSnafu { key })?;
    repository.set(key, value).await
}

/// An error type of accessing the persistent store.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub))]
pub enum StorageError {
    #[snafu(display("Could not decode the value of {key}"))]
    #[non_exhaustive]
    Decode { key: StorageKey, source: SerdeError },
    #[snafu(display("Could not encode the value of {key}"))]
    #[non_exhaustive]
    Encode { key: StorageKey, source: SerdeError },
    #[snafu(whatever, display("Storage access failed: {message}"))]
    #[non_exhaustive]
    Unknown {
        message: String,
        #[snafu(source(from(Box<dyn StdError + Send + Sync>, Some)))]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::entity::Mode;

    #[test]
    fn storage_key_from_str() {
        for key in StorageKey::ALL {
            assert_eq!(key.as_str().parse(), Ok(key));
            assert_eq!(
                serde_json::to_value(key).unwrap(),
                serde_json::json!(key.as_str())
            );
        }
        assert!("timer_state".parse::<StorageKey>().is_err());
    }

    #[tokio::test]
    async fn storage_load() {
        let mut mock = MockStorageRepository::new();
        mock.expect_get()
            .withf(|key| *key == StorageKey::SelectedMode)
            .returning(|_| Ok(Some(serde_json::json!("long_break"))));
        mock.expect_get()
            .withf(|key| *key == StorageKey::Durations)
            .returning(|_| Ok(Some(serde_json::json!("garbage"))));
        mock.expect_get()
            .withf(|key| *key == StorageKey::Theme)
            .returning(|_| Ok(None));

        assert_eq!(
            load::<Mode>(&mock, StorageKey::SelectedMode).await.unwrap(),
            Some(Mode::LongBreak)
        );
        assert!(matches!(
            load::<crate::domain::entity::MinuteDurations>(&mock, StorageKey::Durations).await,
            Err(StorageError::Decode {
                key: StorageKey::Durations,
                ..
            })
        ));
        assert_eq!(
            load::<String>(&mock, StorageKey::Theme).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn storage_store() {
        let mut mock = MockStorageRepository::new();
        mock.expect_set()
            .withf(|key, value| {
                *key == StorageKey::BlockedSites && *value == serde_json::json!(["youtube.com"])
            })
            .times(1)
            .returning(|_, _| Ok(()));

        store(&mock, StorageKey::BlockedSites, &vec!["youtube.com"])
            .await
            .unwrap();
    }
}
