use snafu::prelude::*;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, Sender as OneshotSender};

use crate::domain::entity::{BlockedSiteList, Mode, ModeDurations, TimerState};

/// Actions that a [`WorkerRoutine`] runs.
///
/// [`WorkerRoutine`]: super::routine::WorkerRoutine
#[derive(Debug)]
pub enum Command {
    Query {
        responder: OneshotSender<TimerState>,
    },
    Start,
    Pause,
    Reset,
    ChangeMode(Mode),
    ReloadDurations(ModeDurations),
    UpdateBlockedSites(BlockedSiteList),
    Shutdown {
        responder: OneshotSender<()>,
    },
}

/// Handle that controls a [`WorkerRoutine`]. Commands are queued and
/// processed one at a time, in the order they were sent.
///
/// [`WorkerRoutine`]: super::routine::WorkerRoutine
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    requester: Sender<Command>,
}

impl WorkerHandle {
    /// Creates a new [`WorkerHandle`].
    pub fn new(requester: Sender<Command>) -> Self {
        Self { requester }
    }

    /// Get a snapshot of the current state.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn get_state(&self) -> Result<TimerState, WorkerGoneError> {
        let (responder, receiver) = oneshot::channel();
        self.send(Command::Query { responder }).await?;
        receiver.await.ok().context(WorkerGoneSnafu)
    }

    /// Start or resume the countdown.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn start(&self) -> Result<(), WorkerGoneError> {
        self.send(Command::Start).await
    }

    /// Pause the countdown.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn pause(&self) -> Result<(), WorkerGoneError> {
        self.send(Command::Pause).await
    }

    /// Stop the countdown and restore the full duration.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn reset(&self) -> Result<(), WorkerGoneError> {
        self.send(Command::Reset).await
    }

    /// Switch to another mode.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn change_mode(&self, mode: Mode) -> Result<(), WorkerGoneError> {
        self.send(Command::ChangeMode(mode)).await
    }

    /// Replace the configured durations.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn reload_durations(&self, durations: ModeDurations) -> Result<(), WorkerGoneError> {
        self.send(Command::ReloadDurations(durations)).await
    }

    /// Replace the blocked site list.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has shut down.
    pub async fn update_blocked_sites(
        &self,
        sites: BlockedSiteList,
    ) -> Result<(), WorkerGoneError> {
        self.send(Command::UpdateBlockedSites(sites)).await
    }

    /// Persist the final state and stop the worker. Waits until the worker
    /// has finished.
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker has already shut
    /// down.
    pub async fn shutdown(&self) -> Result<(), WorkerGoneError> {
        let (responder, receiver) = oneshot::channel();
        self.send(Command::Shutdown { responder }).await?;
        receiver.await.ok().context(WorkerGoneSnafu)
    }

    async fn send(&self, command: Command) -> Result<(), WorkerGoneError> {
        self.requester
            .send(command)
            .await
            .ok()
            .context(WorkerGoneSnafu)
    }
}

/// An error indicating the background worker is no longer running.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(display("Timer worker has shut down"))]
pub struct WorkerGoneError;
