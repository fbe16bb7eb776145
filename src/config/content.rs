use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::entity::notification::TryNewNotificationMessageError;
use crate::domain::entity::{Mode, NotificationMessage};

/// Redirect target used when `[blocking] page` is not set.
pub const DEFAULT_BLOCKED_PAGE: &str = "http://localhost/focus-shield/blocked.html";

/// Settings shared by the daemon and the command line client. Every section
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(default)]
    pub notification: NotificationSection,
    #[serde(default)]
    pub blocking: BlockingSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSection {
    pub focus: Option<MessageSection>,
    pub short_break: Option<MessageSection>,
    pub long_break: Option<MessageSection>,
}

impl NotificationSection {
    /// The configured message for `mode`, or the built-in one.
    ///
    /// # Errors
    ///
    /// This function will return an error if the configured message is
    /// invalid.
    pub fn message(&self, mode: Mode) -> Result<NotificationMessage, TryNewNotificationMessageError> {
        let section = match mode {
            Mode::Focus => &self.focus,
            Mode::ShortBreak => &self.short_break,
            Mode::LongBreak => &self.long_break,
        };

        match section {
            Some(MessageSection { summary, body }) => {
                NotificationMessage::try_new(summary.clone(), body.clone())
            }
            None => Ok(NotificationMessage::completed(mode)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageSection {
    pub summary: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockingSection {
    pub page: Option<String>,
}

/// Paths of runtime files. Unset paths resolve to XDG locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    pub socket: Option<PathBuf>,
    pub storage: Option<PathBuf>,
    pub rules: Option<PathBuf>,
}
