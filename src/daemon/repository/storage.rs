use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use serde_json::{Error as SerdeError, Map, Value};
use snafu::prelude::*;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::sync::Mutex;

use crate::domain::repository::{StorageChange, StorageError, StorageKey, StorageRepository};

const CHANGE_BUFFER: usize = 64;

/// A [`StorageRepository`] implementation which keeps every key in one JSON
/// object on disk.
///
/// Keys this program does not know are preserved when the file is rewritten.
pub struct JsonFileStorage {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    changes: Sender<StorageChange>,
}

impl JsonFileStorage {
    /// Load the store from `path`. A missing or empty file is an empty store.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file could not be read or
    /// does not contain a JSON object.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenStorageError> {
        let path = path.as_ref().to_path_buf();

        let values = match tokio::fs::read(&path).await {
            Ok(content) if content.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(content) => serde_json::from_slice(&content).context(ParseSnafu { path: &path })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err).context(ReadSnafu { path }),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "Opened storage");

        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Ok(Self {
            path,
            values: Mutex::new(values),
            changes,
        })
    }

    async fn write_file(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        let content = whatever!(
            serde_json::to_vec_pretty(values),
            "Could not serialize storage"
        );

        if let Some(parent) = self.path.parent() {
            whatever!(
                tokio::fs::create_dir_all(parent).await,
                "Could not create storage directory"
            );
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        whatever!(
            tokio::fs::write(&tmp, content).await,
            "Could not write temporary storage file"
        );
        whatever!(
            tokio::fs::rename(&tmp, &self.path).await,
            "Could not replace storage file"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageRepository for JsonFileStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        Ok(self.values.lock().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StorageError> {
        let mut values = self.values.lock().await;
        if values.get(key.as_str()) == Some(&value) {
            return Ok(());
        }

        let mut updated = values.clone();
        updated.insert(key.as_str().to_owned(), value.clone());
        self.write_file(&updated).await?;
        *values = updated;
        drop(values);

        tracing::trace!(%key, "Storage changed");
        let _ = self.changes.send(StorageChange {
            key,
            new_value: value,
        });
        Ok(())
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// An error type of opening a [`JsonFileStorage`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum OpenStorageError {
    #[snafu(display("Could not read storage file {}", path.display()))]
    Read { path: PathBuf, source: IoError },
    #[snafu(display("Storage file {} is not a JSON object", path.display()))]
    Parse { path: PathBuf, source: SerdeError },
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn json_file_storage_open_missing() {
        let tmp = TempDir::new().expect("Test environment should support temporary directories");
        let file = tmp.child("storage.json");

        let storage = JsonFileStorage::open(file.path()).await.unwrap();
        assert_eq!(storage.get(StorageKey::Durations).await.unwrap(), None);
        file.assert(predicate::path::missing());
    }

    #[tokio::test]
    async fn json_file_storage_set() {
        let tmp = TempDir::new().expect("Test environment should support temporary directories");
        let file = tmp.child("nested/storage.json");

        let storage = JsonFileStorage::open(file.path()).await.unwrap();
        let mut changes = storage.subscribe();
        storage
            .set(StorageKey::SelectedMode, json!("long_break"))
            .await
            .unwrap();

        assert_eq!(
            changes.try_recv().unwrap(),
            StorageChange {
                key: StorageKey::SelectedMode,
                new_value: json!("long_break"),
            }
        );
        file.assert(predicate::str::contains("\"selectedMode\": \"long_break\""));
        tmp.child("nested/storage.json.tmp")
            .assert(predicate::path::missing());

        let reopened = JsonFileStorage::open(file.path()).await.unwrap();
        assert_eq!(
            reopened.get(StorageKey::SelectedMode).await.unwrap(),
            Some(json!("long_break"))
        );
    }

    #[tokio::test]
    async fn json_file_storage_set_unchanged() {
        let tmp = TempDir::new().expect("Test environment should support temporary directories");
        let file = tmp.child("storage.json");
        file.write_str(r#"{"blockedSites": ["youtube.com"]}"#).unwrap();

        let storage = JsonFileStorage::open(file.path()).await.unwrap();
        let mut changes = storage.subscribe();
        storage
            .set(StorageKey::BlockedSites, json!(["youtube.com"]))
            .await
            .unwrap();

        assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));
        file.assert(r#"{"blockedSites": ["youtube.com"]}"#);
    }

    #[tokio::test]
    async fn json_file_storage_preserve_unknown() {
        let tmp = TempDir::new().expect("Test environment should support temporary directories");
        let file = tmp.child("storage.json");
        file.write_str(r#"{"legacy": 1}"#).unwrap();

        let storage = JsonFileStorage::open(file.path()).await.unwrap();
        storage
            .set(StorageKey::Theme, json!("digital"))
            .await
            .unwrap();

        file.assert(predicate::str::contains("\"legacy\": 1"));
        file.assert(predicate::str::contains("\"theme\": \"digital\""));
    }

    #[tokio::test]
    async fn json_file_storage_open_error() {
        let tmp = TempDir::new().expect("Test environment should support temporary directories");
        let file = tmp.child("storage.json");
        file.write_str("[1, 2, 3]").unwrap();

        assert!(matches!(
            JsonFileStorage::open(file.path()).await,
            Err(OpenStorageError::Parse { .. })
        ));
    }
}
