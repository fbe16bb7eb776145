use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

use crate::domain::daemon::worker::{WorkerGoneError, WorkerHandle};
use crate::domain::entity::{BlockedSiteList, MinuteDurations, Mode, ModeDurations};
use crate::domain::repository::{StorageChange, StorageKey};
use crate::tracing_report;

/// Forwards changes of view-owned storage keys to the worker, so that the
/// timer follows whatever any view writes.
pub struct Reconciler {
    changes: Receiver<StorageChange>,
    worker: WorkerHandle,
}

impl Reconciler {
    /// Creates a new [`Reconciler`].
    pub fn new(changes: Receiver<StorageChange>, worker: WorkerHandle) -> Self {
        Self { changes, worker }
    }

    /// Run the [`Reconciler`] on background until the store or the worker
    /// goes away.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            let change = match self.changes.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed storage changes");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if self.forward(change).await.is_err() {
                break;
            }
        }
        tracing::debug!("Reconciler stopped");
    }

    async fn forward(&self, change: StorageChange) -> Result<(), WorkerGoneError> {
        let StorageChange { key, new_value } = change;
        tracing::debug!(%key, "Storage changed");

        match key {
            StorageKey::Durations => match decode_durations(new_value) {
                Some(durations) => self.worker.reload_durations(durations).await,
                None => Ok(()),
            },
            StorageKey::BlockedSites => match decode::<BlockedSiteList>(new_value) {
                Some(sites) => self.worker.update_blocked_sites(sites).await,
                None => Ok(()),
            },
            StorageKey::SelectedMode => match decode::<Mode>(new_value) {
                Some(mode) => self.worker.change_mode(mode).await,
                None => Ok(()),
            },
            StorageKey::TimerState | StorageKey::Theme | StorageKey::BlockNotifications => Ok(()),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing_report!(err, "Ignoring undecodable storage value");
            None
        }
    }
}

fn decode_durations(value: Value) -> Option<ModeDurations> {
    let minutes = decode::<MinuteDurations>(value)?;
    match ModeDurations::try_from(minutes) {
        Ok(durations) => Some(durations),
        Err(err) => {
            tracing_report!(err, "Ignoring invalid durations");
            None
        }
    }
}
