use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// The kind of session the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    /// All modes in their canonical order.
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    /// Get the [`Mode`] selected on first run.
    pub fn initial() -> Self {
        Self::Focus
    }

    /// Returns the key used for this mode in storage and on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Focus => f.write_str("Focus"),
            Self::ShortBreak => f.write_str("Short break"),
            Self::LongBreak => f.write_str("Long break"),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.key() == s)
            .context(UnknownSnafu { key: s })
    }
}

/// An error type of parsing a [`Mode`] from its key.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseModeError {
    #[snafu(display("Unknown mode key {key:?}"))]
    #[non_exhaustive]
    Unknown { key: String },
}
