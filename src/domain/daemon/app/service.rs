use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::prelude::*;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

use crate::domain::daemon::broadcast::{Broadcaster, TimerEvent};
use crate::domain::daemon::inbound::{
    GoneSnafu, InvalidDurationsSnafu, InvalidSnafu, LoadDurationsSnafu, PreferenceError,
    PreferencePort, ReadOnlySnafu, ShutdownPort, StorageSnafu, SubscribePort, TimerError,
    TimerPort, ZeroDurationSnafu,
};
use crate::domain::daemon::worker::WorkerHandle;
use crate::domain::entity::{BlockedSiteList, MinuteDurations, Mode, ModeDurations, TimerState};
use crate::domain::repository::storage;
use crate::domain::repository::{StorageKey, StorageRepository};

pub struct TimerService {
    worker: WorkerHandle,
    storage: Arc<dyn StorageRepository>,
}

impl TimerService {
    pub fn new(worker: WorkerHandle, storage: Arc<dyn StorageRepository>) -> Self {
        Self { worker, storage }
    }
}

#[async_trait::async_trait]
impl TimerPort for TimerService {
    async fn get_state(&self) -> Result<TimerState, TimerError> {
        self.worker.get_state().await.context(GoneSnafu)
    }

    async fn start(&self) -> Result<(), TimerError> {
        self.worker.start().await.context(GoneSnafu)
    }

    async fn pause(&self) -> Result<(), TimerError> {
        self.worker.pause().await.context(GoneSnafu)
    }

    async fn reset(&self) -> Result<(), TimerError> {
        self.worker.reset().await.context(GoneSnafu)
    }

    async fn change_mode(&self, mode: Mode) -> Result<(), TimerError> {
        self.worker.change_mode(mode).await.context(GoneSnafu)
    }

    async fn reload_durations(&self) -> Result<(), TimerError> {
        let minutes = storage::load::<MinuteDurations>(self.storage.as_ref(), StorageKey::Durations)
            .await
            .context(LoadDurationsSnafu)?
            .unwrap_or_default();
        let durations = ModeDurations::try_from(minutes).context(InvalidDurationsSnafu)?;
        self.worker
            .reload_durations(durations)
            .await
            .context(GoneSnafu)
    }
}

#[derive(Debug)]
pub struct SubscribeService {
    broadcaster: Broadcaster,
}

impl SubscribeService {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }
}

impl SubscribePort for SubscribeService {
    fn subscribe(&self) -> Receiver<TimerEvent> {
        self.broadcaster.subscribe()
    }
}

pub struct PreferenceService {
    storage: Arc<dyn StorageRepository>,
}

impl PreferenceService {
    pub fn new(storage: Arc<dyn StorageRepository>) -> Self {
        Self { storage }
    }
}

#[async_trait::async_trait]
impl PreferencePort for PreferenceService {
    async fn read(&self, key: StorageKey) -> Result<Option<Value>, PreferenceError> {
        self.storage.get(key).await.context(StorageSnafu)
    }

    async fn write(&self, key: StorageKey, value: Value) -> Result<(), PreferenceError> {
        let value = match key {
            StorageKey::TimerState => return ReadOnlySnafu { key }.fail(),
            StorageKey::Durations => {
                let minutes: MinuteDurations = decode(key, value)?;
                ModeDurations::try_from(minutes).context(ZeroDurationSnafu { key })?;
                encode(key, &minutes)?
            }
            StorageKey::BlockedSites => {
                let sites: BlockedSiteList = decode(key, value)?;
                encode(key, &sites)?
            }
            StorageKey::SelectedMode => encode(key, &decode::<Mode>(key, value)?)?,
            StorageKey::Theme => encode(key, &decode::<View>(key, value)?)?,
            StorageKey::BlockNotifications => encode(key, &decode::<bool>(key, value)?)?,
        };

        tracing::debug!(%key, "Writing preference");
        self.storage.set(key, value).await.context(StorageSnafu)
    }
}

pub struct ShutdownService {
    worker: WorkerHandle,
    reconciler: JoinHandle<()>,
}

impl ShutdownService {
    pub fn new(worker: WorkerHandle, reconciler: JoinHandle<()>) -> Self {
        Self { worker, reconciler }
    }
}

#[async_trait::async_trait]
impl ShutdownPort for ShutdownService {
    async fn shutdown(&self) {
        self.reconciler.abort();
        if self.worker.shutdown().await.is_err() {
            tracing::warn!("Timer worker was already gone");
        }
    }
}

/// The timer views a user may choose from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum View {
    Circular,
    Digital,
    Segmented,
}

fn decode<T: DeserializeOwned>(key: StorageKey, value: Value) -> Result<T, PreferenceError> {
    serde_json::from_value(value).context(InvalidSnafu { key })
}

fn encode<T: Serialize>(key: StorageKey, value: &T) -> Result<Value, PreferenceError> {
    serde_json::to_value(value).context(InvalidSnafu { key })
}
