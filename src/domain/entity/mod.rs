pub mod durations;
pub mod mode;
pub mod notification;
pub mod rule;
pub mod site;
pub mod timer;

pub use durations::{MinuteDurations, ModeDurations, TryNewModeDurationsError};
pub use mode::{Mode, ParseModeError};
pub use notification::NotificationMessage;
pub use rule::{BlockingRule, RuleId};
pub use site::BlockedSiteList;
pub use timer::{TickOutcome, TimerState, TimerStatus};
