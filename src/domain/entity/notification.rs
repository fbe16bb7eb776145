use snafu::prelude::*;

use crate::domain::entity::Mode;

/// The message shown to the user when a session of some [`Mode`] completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    summary: String,
    body: Option<String>,
}

impl NotificationMessage {
    /// Try to create a [`NotificationMessage`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the summary is empty.
    pub fn try_new(
        summary: String,
        body: Option<String>,
    ) -> Result<Self, TryNewNotificationMessageError> {
        ensure!(!summary.trim().is_empty(), EmptySummarySnafu);
        Ok(Self { summary, body })
    }

    /// The built-in message for a completed session of `mode`.
    pub fn completed(mode: Mode) -> Self {
        let (summary, body) = match mode {
            Mode::Focus => ("Focus session complete", "Well done! Time for a break."),
            Mode::ShortBreak => ("Short break is over", "Ready to focus again?"),
            Mode::LongBreak => ("Long break is over", "Feel energetic now? Let's continue."),
        };
        Self {
            summary: summary.to_owned(),
            body: Some(body.to_owned()),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// An error type of creating a [`NotificationMessage`].
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNewNotificationMessageError {
    #[snafu(display("Summary of a notification must be non-empty"))]
    #[non_exhaustive]
    EmptySummary,
}
