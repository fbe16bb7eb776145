use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use notify_rust::Notification;
use snafu::prelude::*;
use tokio::sync::Mutex;

use crate::domain::daemon::outbound::{
    DuplicateIdSnafu, NotifyError, NotifyPort, NotifyRequest, RuleTableError, RuleTablePort,
};
use crate::domain::entity::{BlockingRule, RuleId};

#[derive(Debug, Clone)]
pub struct NotifyService {
    app_name: String,
}

impl NotifyService {
    pub fn new(app_name: String) -> Self {
        Self { app_name }
    }
}

#[async_trait::async_trait]
impl NotifyPort for NotifyService {
    async fn notify_impl(&self, request: NotifyRequest) -> Result<(), NotifyError> {
        let mut notification = Notification::new();
        notification.appname(&self.app_name);
        notification.summary(&request.summary);

        if let Some(body) = request.body {
            notification.body(&body);
        }

        let _ = whatever!(
            notification.show_async().await,
            "Could not show desktop notification",
        );

        Ok(())
    }
}

/// A [`RuleTablePort`] implementation which keeps the rule table as a JSON
/// array on disk, where a browser-side shim picks it up and installs it.
pub struct RuleFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RuleFile {
    /// Creates a new [`RuleFile`]. The file is created on the first update.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn read_rules(&self) -> Result<Vec<BlockingRule>, RuleTableError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).whatever_context("Could not read rule file"),
        };

        let rules: Vec<BlockingRule> =
            whatever!(serde_json::from_slice(&content), "Rule file is malformed");
        ensure_unique(&rules)?;
        Ok(rules)
    }

    async fn write_rules(&self, rules: &[BlockingRule]) -> Result<(), RuleTableError> {
        let content = whatever!(
            serde_json::to_vec_pretty(rules),
            "Could not serialize rules"
        );

        if let Some(parent) = self.path.parent() {
            whatever!(
                tokio::fs::create_dir_all(parent).await,
                "Could not create rule file directory"
            );
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        whatever!(
            tokio::fs::write(&tmp, content).await,
            "Could not write temporary rule file"
        );
        whatever!(
            tokio::fs::rename(&tmp, &self.path).await,
            "Could not replace rule file"
        );

        Ok(())
    }
}

fn ensure_unique(rules: &[BlockingRule]) -> Result<(), RuleTableError> {
    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        ensure!(seen.insert(rule.id), DuplicateIdSnafu { id: rule.id });
    }
    Ok(())
}

#[async_trait::async_trait]
impl RuleTablePort for RuleFile {
    async fn dynamic_rules(&self) -> Result<Vec<BlockingRule>, RuleTableError> {
        let _guard = self.lock.lock().await;
        self.read_rules().await
    }

    async fn update_dynamic_rules(
        &self,
        remove: Vec<RuleId>,
        add: Vec<BlockingRule>,
    ) -> Result<(), RuleTableError> {
        let _guard = self.lock.lock().await;

        let mut rules = self.read_rules().await?;
        rules.retain(|rule| !remove.contains(&rule.id));
        rules.extend(add);
        ensure_unique(&rules)?;

        self.write_rules(&rules).await?;
        tracing::debug!(path = %self.path.display(), count = rules.len(), "Updated rule file");
        Ok(())
    }
}
