use std::sync::Arc;

use crate::domain::daemon::app::service::{
    PreferenceService, ShutdownService, SubscribeService, TimerService,
};
use crate::domain::daemon::blocking::{BlockedPage, BlockingSynchronizer};
use crate::domain::daemon::broadcast::Broadcaster;
use crate::domain::daemon::inbound::{PreferencePort, ShutdownPort, SubscribePort, TimerPort};
use crate::domain::daemon::outbound::{NotifyPort, RuleTablePort};
use crate::domain::daemon::reconcile::Reconciler;
use crate::domain::daemon::worker::{self, WorkerPorts};
use crate::domain::repository::{NotificationRepository, StorageRepository};

/// How many events a slow listener may fall behind before it skips some.
const EVENT_BUFFER: usize = 64;

/// External repositories and adapters the application is built on.
pub struct Adapters {
    pub storage: Arc<dyn StorageRepository>,
    pub rule_table: Arc<dyn RuleTablePort>,
    pub blocked_page: BlockedPage,
    pub notifier: Arc<dyn NotifyPort>,
    pub messages: Arc<dyn NotificationRepository>,
}

/// Entrance to the domain logic, providing ports for external adapters.
pub struct ApplicationCore {
    pub timer: Arc<dyn TimerPort>,
    pub subscribe: Arc<dyn SubscribePort>,
    pub preference: Arc<dyn PreferencePort>,
    pub shutdown: Arc<dyn ShutdownPort>,
}

impl ApplicationCore {
    /// Initialize the application by injecting external repositories and
    /// adapters. The timer is restored from the store before this returns.
    pub async fn setup(adapters: Adapters) -> ApplicationCore {
        let Adapters {
            storage,
            rule_table,
            blocked_page,
            notifier,
            messages,
        } = adapters;

        let broadcaster = Broadcaster::new(EVENT_BUFFER);
        let changes = storage.subscribe();

        let worker = worker::spawn(WorkerPorts {
            storage: Arc::clone(&storage),
            synchronizer: BlockingSynchronizer::new(rule_table, blocked_page),
            broadcaster: broadcaster.clone(),
            notifier,
            messages,
        })
        .await;
        let reconciler = Reconciler::new(changes, worker.clone()).spawn();

        ApplicationCore {
            timer: Arc::new(TimerService::new(worker.clone(), Arc::clone(&storage))),
            subscribe: Arc::new(SubscribeService::new(broadcaster)),
            preference: Arc::new(PreferenceService::new(storage)),
            shutdown: Arc::new(ShutdownService::new(worker, reconciler)),
        }
    }
}
