use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

use crate::domain::daemon::blocking::BlockingSynchronizer;
use crate::domain::daemon::broadcast::{Broadcaster, TimerEvent};
use crate::domain::daemon::outbound::NotifyPort;
use crate::domain::daemon::worker::handle::Command;
use crate::domain::daemon::worker::state::WorkerState;
use crate::domain::entity::{BlockedSiteList, Mode, NotificationMessage, TimerState};
use crate::domain::repository::storage::{self, StorageKey};
use crate::domain::repository::{NotificationRepository, StorageRepository};
use crate::tracing_report;

/// Collaborators the worker talks to after every state change.
pub struct WorkerPorts {
    pub storage: Arc<dyn StorageRepository>,
    pub synchronizer: BlockingSynchronizer,
    pub broadcaster: Broadcaster,
    pub notifier: Arc<dyn NotifyPort>,
    pub messages: Arc<dyn NotificationRepository>,
}

/// A [`WorkerContext`] stores all objects relavent to the [`WorkerRoutine`]
/// and the business logic. It is the only owner of the [`TimerState`].
pub struct WorkerContext {
    pub timer: TimerState,
    pub sites: BlockedSiteList,
    pub commands: Receiver<Command>,
    pub ports: WorkerPorts,
}

impl WorkerContext {
    /// Persist and broadcast the current state, then bring the blocking
    /// rules in line with it. Failures are logged and the in-memory state
    /// stays authoritative.
    pub async fn sync(&self) {
        self.persist().await;
        self.ports
            .broadcaster
            .send(TimerEvent::TimerUpdate(self.timer.clone()));
        self.update_blocking().await;
    }

    pub async fn persist(&self) {
        let res = storage::store(
            self.ports.storage.as_ref(),
            StorageKey::TimerState,
            &self.timer,
        )
        .await;

        if let Err(err) = res {
            tracing_report!(err, "Could not persist timer state");
        }
    }

    pub async fn update_blocking(&self) {
        self.ports
            .synchronizer
            .update_blocking(self.timer.mode(), self.timer.status(), &self.sites)
            .await;
    }

    /// Signal that a session of `mode` counted down to zero.
    pub async fn complete(&self, mode: Mode) {
        tracing::info!(%mode, "Session complete");

        let message = match self.ports.messages.completion_message(mode).await {
            Ok(message) => message,
            Err(err) => {
                tracing_report!(err, "Could not load completion message");
                NotificationMessage::completed(mode)
            }
        };

        if let Err(err) = self.ports.notifier.notify(&message).await {
            tracing_report!(err, "Could not show completion notification");
        }

        self.ports
            .broadcaster
            .send(TimerEvent::SessionComplete { mode });
    }
}

/// A type responsible for the daemon's main business logic. A
/// [`WorkerRoutine`] runs on background, receiving [`Command`]s from
/// [`WorkerHandle`].
///
/// [`WorkerHandle`]: super::WorkerHandle
pub struct WorkerRoutine {
    context: WorkerContext,
    state: WorkerState,
}

impl WorkerRoutine {
    /// Spawn a running [`WorkerRoutine`] on background.
    pub fn spawn(context: WorkerContext) -> JoinHandle<()> {
        tokio::spawn(async move {
            let state = WorkerState::enter(context.timer.status()).await;
            let mut worker = Self { context, state };
            worker.run().await;
            tracing::info!("Timer worker terminated");
        })
    }

    /// Main part of its business logic.
    async fn run(&mut self) {
        while !self.state.is_terminated() {
            self.state.run(&mut self.context).await;
        }
    }
}
