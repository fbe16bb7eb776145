pub(crate) mod handle;
pub(crate) mod routine;
mod state;

pub use handle::{WorkerGoneError, WorkerHandle};
pub use routine::WorkerPorts;

use crate::domain::entity::{BlockedSiteList, MinuteDurations, ModeDurations, TimerState};
use crate::domain::repository::storage::{self, StorageKey};
use crate::domain::repository::StorageRepository;
use crate::tracing_report;

use routine::{WorkerContext, WorkerRoutine};

/// Capacity of the command queue in front of the worker.
const COMMAND_BUFFER: usize = 8;

/// Restore the timer from the store and spawn the worker on background.
/// Unreadable values are logged and replaced by defaults, so the daemon
/// always comes up.
pub async fn spawn(ports: WorkerPorts) -> WorkerHandle {
    let (requester, commands) = tokio::sync::mpsc::channel(COMMAND_BUFFER);

    let durations = load_durations(ports.storage.as_ref()).await;
    let sites = load_sites(ports.storage.as_ref()).await;
    let mut timer = load_timer(ports.storage.as_ref())
        .await
        .normalize(durations);
    timer.reload_durations(durations);

    tracing::info!(
        mode = %timer.mode(),
        status = %timer.status(),
        time_left = timer.time_left(),
        sites = sites.len(),
        "Restored timer state"
    );

    let context = WorkerContext {
        timer,
        sites,
        commands,
        ports,
    };
    context.persist().await;
    context.update_blocking().await;

    WorkerRoutine::spawn(context);
    WorkerHandle::new(requester)
}

async fn load_durations(repository: &dyn StorageRepository) -> ModeDurations {
    let minutes = match storage::load::<MinuteDurations>(repository, StorageKey::Durations).await {
        Ok(minutes) => minutes.unwrap_or_default(),
        Err(err) => {
            tracing_report!(err, "Could not load durations, using defaults");
            MinuteDurations::default()
        }
    };

    match ModeDurations::try_from(minutes) {
        Ok(durations) => durations,
        Err(err) => {
            tracing_report!(err, "Stored durations are invalid, using defaults");
            ModeDurations::default()
        }
    }
}

async fn load_sites(repository: &dyn StorageRepository) -> BlockedSiteList {
    match storage::load::<BlockedSiteList>(repository, StorageKey::BlockedSites).await {
        Ok(sites) => sites.unwrap_or_default(),
        Err(err) => {
            tracing_report!(err, "Could not load blocked sites");
            BlockedSiteList::new()
        }
    }
}

async fn load_timer(repository: &dyn StorageRepository) -> TimerState {
    match storage::load::<TimerState>(repository, StorageKey::TimerState).await {
        Ok(timer) => timer.unwrap_or_default(),
        Err(err) => {
            tracing_report!(err, "Could not load timer state, starting over");
            TimerState::default()
        }
    }
}
