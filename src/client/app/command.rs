use crate::domain::entity::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the timer's current state
    State,
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset the current session
    Reset,
    /// Switch to another mode
    Mode(Mode),
    /// Show or change the configured durations
    Durations(DurationArguments),
    /// Manage the blocked sites
    Block(BlockCommand),
    /// Follow the timer until interrupted
    Watch,
}

/// New durations in minutes. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationArguments {
    pub focus: Option<u64>,
    pub short_break: Option<u64>,
    pub long_break: Option<u64>,
}

impl DurationArguments {
    pub fn is_empty(&self) -> bool {
        self.focus.is_none() && self.short_break.is_none() && self.long_break.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCommand {
    Add(String),
    Remove(String),
    List,
}
