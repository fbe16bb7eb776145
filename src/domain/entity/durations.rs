use serde::{Deserialize, Serialize, Serializer};
use snafu::prelude::*;

use crate::domain::entity::Mode;

/// The configured length of each [`Mode`]'s session, represented in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDurations {
    focus: u64,
    short_break: u64,
    long_break: u64,
}

impl ModeDurations {
    /// Try to create a [`ModeDurations`] from seconds.
    ///
    /// # Errors
    ///
    /// This function will return an error if any duration is zero.
    pub fn try_new(
        focus: u64,
        short_break: u64,
        long_break: u64,
    ) -> Result<Self, TryNewModeDurationsError> {
        ensure!(focus > 0, ZeroSnafu { mode: Mode::Focus });
        ensure!(short_break > 0, ZeroSnafu { mode: Mode::ShortBreak });
        ensure!(long_break > 0, ZeroSnafu { mode: Mode::LongBreak });
        Ok(Self {
            focus,
            short_break,
            long_break,
        })
    }

    /// Get the duration in seconds corresponding to mode.
    pub fn get(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Focus => self.focus,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    /// Returns `true` if every duration is non-zero. Values deserialized
    /// from storage bypass [`ModeDurations::try_new`], so callers check this.
    pub fn is_valid(&self) -> bool {
        Mode::ALL.into_iter().all(|mode| self.get(mode) > 0)
    }
}

impl Default for ModeDurations {
    fn default() -> Self {
        MinuteDurations::default().to_seconds()
    }
}

/// Durations as the options view stores them, in minutes. Fractions are
/// allowed and round to the nearest second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteDurations {
    #[serde(serialize_with = "serialize_minutes")]
    pub focus: f64,
    #[serde(serialize_with = "serialize_minutes")]
    pub short_break: f64,
    #[serde(serialize_with = "serialize_minutes")]
    pub long_break: f64,
}

impl Default for MinuteDurations {
    fn default() -> Self {
        Self {
            focus: 25.0,
            short_break: 5.0,
            long_break: 30.0,
        }
    }
}

impl MinuteDurations {
    fn to_seconds(self) -> ModeDurations {
        ModeDurations {
            focus: minutes_to_seconds(self.focus),
            short_break: minutes_to_seconds(self.short_break),
            long_break: minutes_to_seconds(self.long_break),
        }
    }
}

/// Negative and NaN inputs become zero; the cast saturates on overflow.
fn minutes_to_seconds(minutes: f64) -> u64 {
    (minutes * 60.0).round() as u64
}

/// Whole minutes are written as integers, the way the options view writes
/// them.
fn serialize_minutes<S: Serializer>(minutes: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if minutes.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(minutes) {
        serializer.serialize_u64(*minutes as u64)
    } else {
        serializer.serialize_f64(*minutes)
    }
}

impl TryFrom<MinuteDurations> for ModeDurations {
    type Error = TryNewModeDurationsError;

    fn try_from(value: MinuteDurations) -> Result<Self, Self::Error> {
        let seconds = value.to_seconds();
        Self::try_new(seconds.focus, seconds.short_break, seconds.long_break)
    }
}

/// An error type of creating a [`ModeDurations`].
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNewModeDurationsError {
    #[snafu(display("Duration of {mode} must be greater than zero"))]
    #[non_exhaustive]
    Zero { mode: Mode },
}
