use std::sync::Arc;

use futures::StreamExt;
use serde_json::Error as SerdeError;
use snafu::prelude::*;

use crate::client::app::command::{BlockCommand, Command, DurationArguments};
use crate::domain::client::outbound::{RequestDaemonError, WatchEvent};
use crate::domain::client::ApplicationCore;
use crate::domain::entity::{
    BlockedSiteList, MinuteDurations, Mode, ModeDurations, TimerState, TryNewModeDurationsError,
};
use crate::domain::repository::StorageKey;

/// Main business logic implementation in client side.
pub struct Client {
    core: Arc<ApplicationCore>,
}

impl Client {
    /// Creates a new [`Client`].
    pub fn new(core: Arc<ApplicationCore>) -> Self {
        Self { core }
    }

    /// Run specific function according to `command`.
    ///
    /// # Errors
    ///
    /// This function will return an error if any error occurs.
    pub async fn run(&self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::State => {
                let state = self.core.timer.get_state().await.context(RequestSnafu)?;
                println!("{}", format_state(&state));
            }
            Command::Start => self.acknowledged(self.core.timer.start().await)?,
            Command::Pause => self.acknowledged(self.core.timer.pause().await)?,
            Command::Reset => self.acknowledged(self.core.timer.reset().await)?,
            Command::Mode(mode) => self.acknowledged(self.core.timer.change_mode(mode).await)?,
            Command::Durations(args) => {
                for line in self.durations(args).await? {
                    println!("{line}");
                }
            }
            Command::Block(command) => {
                for line in self.block(command).await? {
                    println!("{line}");
                }
            }
            Command::Watch => self.watch().await?,
        }
        Ok(())
    }

    fn acknowledged(&self, result: Result<String, RequestDaemonError>) -> Result<(), ClientError> {
        let reply = result.context(RequestSnafu)?;
        println!("{reply}");
        Ok(())
    }

    /// Show the stored durations, or store new ones and let the daemon pick
    /// them up.
    async fn durations(&self, args: DurationArguments) -> Result<Vec<String>, ClientError> {
        let preference = &self.core.preference;
        let current = match preference
            .read(StorageKey::Durations)
            .await
            .context(RequestSnafu)?
        {
            Some(value) => serde_json::from_value(value).context(MalformedSnafu {
                key: StorageKey::Durations,
            })?,
            None => MinuteDurations::default(),
        };

        if args.is_empty() {
            return Ok(format_durations(&current));
        }

        let minutes = |arg: Option<u64>, stored: f64| arg.map_or(stored, |value| value as f64);
        let durations = MinuteDurations {
            focus: minutes(args.focus, current.focus),
            short_break: minutes(args.short_break, current.short_break),
            long_break: minutes(args.long_break, current.long_break),
        };
        ModeDurations::try_from(durations).context(InvalidDurationsSnafu)?;

        let value = serde_json::to_value(durations).context(MalformedSnafu {
            key: StorageKey::Durations,
        })?;
        preference
            .write(StorageKey::Durations, value)
            .await
            .context(RequestSnafu)?;
        let reply = self
            .core
            .timer
            .change_durations()
            .await
            .context(RequestSnafu)?;

        let mut lines = format_durations(&durations);
        lines.push(reply);
        Ok(lines)
    }

    /// Edit or list the blocked sites through the store.
    async fn block(&self, command: BlockCommand) -> Result<Vec<String>, ClientError> {
        let preference = &self.core.preference;
        let mut sites: BlockedSiteList = match preference
            .read(StorageKey::BlockedSites)
            .await
            .context(RequestSnafu)?
        {
            Some(value) => serde_json::from_value(value).context(MalformedSnafu {
                key: StorageKey::BlockedSites,
            })?,
            None => BlockedSiteList::new(),
        };

        let line = match command {
            BlockCommand::List => return Ok(sites.iter().map(ToOwned::to_owned).collect()),
            BlockCommand::Add(site) if sites.contains(&site) => {
                return Ok(vec![format!("{site} is already blocked")])
            }
            BlockCommand::Add(site) if sites.insert(&site) => format!("Blocked {site}"),
            BlockCommand::Add(site) => return Ok(vec![format!("{site:?} is not a valid site")]),
            BlockCommand::Remove(site) if sites.remove(&site) => format!("Unblocked {site}"),
            BlockCommand::Remove(site) => return Ok(vec![format!("{site} is not blocked")]),
        };

        let value = serde_json::to_value(&sites).context(MalformedSnafu {
            key: StorageKey::BlockedSites,
        })?;
        preference
            .write(StorageKey::BlockedSites, value)
            .await
            .context(RequestSnafu)?;
        Ok(vec![line])
    }

    /// Print every update until the daemon goes away.
    async fn watch(&self) -> Result<(), ClientError> {
        let mut events = self.core.watch.watch().await.context(RequestSnafu)?;
        while let Some(event) = events.next().await {
            match event.context(RequestSnafu)? {
                WatchEvent::State(state) => println!("{}", format_state(&state)),
                WatchEvent::SessionComplete(mode) => println!("{mode} session complete"),
            }
        }
        Ok(())
    }
}

/// Format seconds as `mm:ss`.
pub fn clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn format_state(state: &TimerState) -> String {
    format!(
        "{} {} ({})",
        clock(state.time_left()),
        state.mode(),
        state.status()
    )
}

fn format_durations(durations: &MinuteDurations) -> Vec<String> {
    Mode::ALL
        .into_iter()
        .map(|mode| {
            let minutes = match mode {
                Mode::Focus => durations.focus,
                Mode::ShortBreak => durations.short_break,
                Mode::LongBreak => durations.long_break,
            };
            format!("{mode} = {minutes}min")
        })
        .collect()
}

/// An error for client's operations.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ClientError {
    #[snafu(display("Could not request daemon"))]
    Request { source: RequestDaemonError },
    #[snafu(display("Stored {key} is malformed"))]
    Malformed { key: StorageKey, source: SerdeError },
    #[snafu(display("Durations are invalid"))]
    InvalidDurations { source: TryNewModeDurationsError },
}
