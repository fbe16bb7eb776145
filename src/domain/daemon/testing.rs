//! In-memory adapters used by the daemon's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::sync::mpsc;
use url::Url;

use crate::domain::daemon::blocking::{BlockedPage, BlockingSynchronizer};
use crate::domain::daemon::broadcast::Broadcaster;
use crate::domain::daemon::outbound::{
    NotifyError, NotifyPort, NotifyRequest, RuleTableError, RuleTablePort,
};
use crate::domain::daemon::worker::handle::Command;
use crate::domain::daemon::worker::routine::{WorkerContext, WorkerPorts};
use crate::domain::entity::{
    BlockedSiteList, BlockingRule, Mode, ModeDurations, NotificationMessage, RuleId, TimerState,
};
use crate::domain::repository::storage::{self, StorageError};
use crate::domain::repository::{
    GetNotificationError, NotificationRepository, StorageChange, StorageKey, StorageRepository,
};

pub fn durations() -> ModeDurations {
    ModeDurations::default()
}

pub fn page() -> BlockedPage {
    BlockedPage::new(Url::parse("chrome-extension://focus/blocked.html").unwrap())
}

#[derive(Debug)]
pub struct MemoryStorage {
    values: Mutex<HashMap<StorageKey, Value>>,
    changes: Sender<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            values: Mutex::new(HashMap::new()),
            changes,
        }
    }

    pub fn raw(&self, key: StorageKey) -> Option<Value> {
        self.values.lock().unwrap().get(&key).cloned()
    }

    pub fn put(&self, key: StorageKey, value: Value) {
        self.values.lock().unwrap().insert(key, value);
    }
}

#[async_trait::async_trait]
impl StorageRepository for MemoryStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StorageError> {
        let previous = self.values.lock().unwrap().insert(key, value.clone());
        if previous.as_ref() != Some(&value) {
            let _ = self.changes.send(StorageChange {
                key,
                new_value: value,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[derive(Debug, Default)]
pub struct MemoryRuleTable {
    rules: Mutex<Vec<BlockingRule>>,
    updates: Mutex<Vec<(Vec<RuleId>, Vec<BlockingRule>)>>,
}

impl MemoryRuleTable {
    pub fn rules(&self) -> Vec<BlockingRule> {
        self.rules.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(Vec<RuleId>, Vec<BlockingRule>)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RuleTablePort for MemoryRuleTable {
    async fn dynamic_rules(&self) -> Result<Vec<BlockingRule>, RuleTableError> {
        Ok(self.rules())
    }

    async fn update_dynamic_rules(
        &self,
        remove: Vec<RuleId>,
        add: Vec<BlockingRule>,
    ) -> Result<(), RuleTableError> {
        self.updates
            .lock()
            .unwrap()
            .push((remove.clone(), add.clone()));
        let mut rules = self.rules.lock().unwrap();
        rules.retain(|rule| !remove.contains(&rule.id));
        rules.extend(add);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<NotifyRequest>>,
}

#[async_trait::async_trait]
impl NotifyPort for RecordingNotifier {
    async fn notify_impl(&self, request: NotifyRequest) -> Result<(), NotifyError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Debug)]
pub struct BuiltinMessages;

#[async_trait::async_trait]
impl NotificationRepository for BuiltinMessages {
    async fn completion_message(
        &self,
        mode: Mode,
    ) -> Result<NotificationMessage, GetNotificationError> {
        Ok(NotificationMessage::completed(mode))
    }
}

/// The set of fakes a worker is wired to.
pub struct Fixture {
    pub storage: Arc<MemoryStorage>,
    pub table: Arc<MemoryRuleTable>,
    pub notifier: Arc<RecordingNotifier>,
    pub broadcaster: Broadcaster,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            table: Arc::new(MemoryRuleTable::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            broadcaster: Broadcaster::new(64),
        }
    }

    pub fn ports(&self) -> WorkerPorts {
        WorkerPorts {
            storage: Arc::clone(&self.storage) as Arc<dyn StorageRepository>,
            synchronizer: BlockingSynchronizer::new(
                Arc::clone(&self.table) as Arc<dyn RuleTablePort>,
                page(),
            ),
            broadcaster: self.broadcaster.clone(),
            notifier: Arc::clone(&self.notifier) as Arc<dyn NotifyPort>,
            messages: Arc::new(BuiltinMessages),
        }
    }

    pub fn context(&self, timer: TimerState) -> (mpsc::Sender<Command>, WorkerContext) {
        let (requester, commands) = mpsc::channel(8);
        let context = WorkerContext {
            timer,
            sites: BlockedSiteList::new(),
            commands,
            ports: self.ports(),
        };
        (requester, context)
    }

    pub fn stored_timer(&self) -> Option<TimerState> {
        self.storage
            .raw(StorageKey::TimerState)
            .map(|value| serde_json::from_value(value).unwrap())
    }

    pub async fn store<T: serde::Serialize>(&self, key: StorageKey, value: &T) {
        storage::store(self.storage.as_ref(), key, value)
            .await
            .unwrap();
    }

    pub fn notifications(&self) -> Vec<NotifyRequest> {
        self.notifier.requests.lock().unwrap().clone()
    }
}
