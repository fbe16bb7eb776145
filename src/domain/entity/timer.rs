use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Mode, ModeDurations};

/// Whether the countdown is progressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
}

impl Display for TimerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Stopped => f.write_str("Stopped"),
            Self::Running => f.write_str("Running"),
            Self::Paused => f.write_str("Paused"),
        }
    }
}

/// What a single tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed and the session goes on.
    Elapsed,
    /// The session reached zero and has been reset to its full duration.
    Completed,
    /// The timer is not running, nothing happened.
    Idle,
}

/// The canonical state of the timer. Its serialized form is what views read
/// from the `timerState` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    #[serde(rename = "timeLeft")]
    time_left: u64,
    duration: u64,
    status: TimerStatus,
    mode: Mode,
    mode_durations: ModeDurations,
}

impl TimerState {
    /// Creates a stopped [`TimerState`] in the initial mode.
    pub fn new(mode_durations: ModeDurations) -> Self {
        let mode = Mode::initial();
        let duration = mode_durations.get(mode);
        Self {
            time_left: duration,
            duration,
            status: TimerStatus::Stopped,
            mode,
            mode_durations,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Seconds remaining in the current session.
    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    /// Total length of the current session in seconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn mode_durations(&self) -> &ModeDurations {
        &self.mode_durations
    }

    /// Returns `true` if websites should be blocked in this state.
    pub fn blocking_active(&self) -> bool {
        self.mode == Mode::Focus && self.status == TimerStatus::Running
    }

    /// Mark the countdown as running. Resuming a paused session keeps the
    /// remaining time.
    pub fn start(&mut self) {
        self.status = TimerStatus::Running;
    }

    /// Freeze the countdown. A stopped timer stays stopped, since pausing a
    /// session that has not started is meaningless.
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
        }
    }

    /// Stop the countdown and restore the full duration of the current mode.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Stopped;
        self.duration = self.mode_durations.get(self.mode);
        self.time_left = self.duration;
    }

    /// Switch to another mode. Selecting the current mode also resets it.
    pub fn change_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    /// Replace the configured durations. Only a stopped session picks up the
    /// new length immediately.
    pub fn reload_durations(&mut self, mode_durations: ModeDurations) {
        self.mode_durations = mode_durations;
        if self.status == TimerStatus::Stopped {
            self.reset();
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Idle;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.reset();
            TickOutcome::Completed
        } else {
            TickOutcome::Elapsed
        }
    }

    /// Repair a state read back from storage so that the invariants hold
    /// again, replacing invalid durations with `fallback`.
    pub fn normalize(mut self, fallback: ModeDurations) -> Self {
        if !self.mode_durations.is_valid() {
            self.mode_durations = fallback;
        }

        match self.status {
            TimerStatus::Stopped => self.reset(),
            TimerStatus::Running | TimerStatus::Paused => {
                if self.duration == 0 {
                    self.duration = self.mode_durations.get(self.mode);
                }
                self.time_left = self.time_left.min(self.duration);
                if self.time_left == 0 {
                    self.reset();
                }
            }
        }

        self
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(ModeDurations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durations() -> ModeDurations {
        ModeDurations::try_new(1500, 300, 1800).unwrap()
    }

    fn assert_bounded(state: &TimerState) {
        assert!(state.time_left() <= state.duration());
        if state.status() == TimerStatus::Stopped {
            assert_eq!(state.time_left(), state.duration());
        }
    }

    #[test]
    fn timer_state_default() {
        let state = TimerState::default();
        assert_eq!(state.mode(), Mode::Focus);
        assert_eq!(state.status(), TimerStatus::Stopped);
        assert_eq!(state.time_left(), 1500);
        assert_eq!(state.duration(), 1500);
        assert!(!state.blocking_active());
    }

    #[test]
    fn timer_state_start_pause() {
        let mut state = TimerState::new(durations());
        state.start();
        assert!(state.blocking_active());
        state.tick();
        state.tick();
        state.pause();
        assert_eq!(state.status(), TimerStatus::Paused);
        assert_eq!(state.time_left(), 1498);
        assert!(!state.blocking_active());

        let snapshot = state.clone();
        state.pause();
        assert_eq!(state, snapshot);
        assert_eq!(state.tick(), TickOutcome::Idle);
        assert_eq!(state, snapshot);

        state.start();
        assert_eq!(state.time_left(), 1498);
        assert_eq!(state.status(), TimerStatus::Running);
    }

    #[test]
    fn timer_state_pause_stopped() {
        let mut state = TimerState::new(durations());
        let snapshot = state.clone();
        state.pause();
        assert_eq!(state, snapshot);
    }

    #[test]
    fn timer_state_reset_idempotent() {
        let mut state = TimerState::new(durations());
        let snapshot = state.clone();
        state.reset();
        assert_eq!(state, snapshot);
    }

    #[test]
    fn timer_state_change_mode() {
        for status in [
            TimerStatus::Stopped,
            TimerStatus::Running,
            TimerStatus::Paused,
        ] {
            for mode in Mode::ALL {
                let mut state = TimerState::new(durations());
                state.start();
                for _ in 0..300 {
                    state.tick();
                }
                if status == TimerStatus::Paused {
                    state.pause();
                } else if status == TimerStatus::Stopped {
                    state.reset();
                }

                state.change_mode(mode);
                assert_eq!(state.mode(), mode);
                assert_eq!(state.status(), TimerStatus::Stopped);
                assert_eq!(state.time_left(), durations().get(mode));
                assert_eq!(state.duration(), durations().get(mode));
            }
        }
    }

    #[test]
    fn timer_state_change_mode_while_running() {
        let mut state = TimerState::new(durations());
        state.start();
        for _ in 0..300 {
            state.tick();
        }
        assert_eq!(state.time_left(), 1200);

        state.change_mode(Mode::ShortBreak);
        assert_eq!(state.status(), TimerStatus::Stopped);
        assert_eq!(state.mode(), Mode::ShortBreak);
        assert_eq!(state.time_left(), 300);
        assert_eq!(state.duration(), 300);
        assert!(!state.blocking_active());
    }

    #[derive(Debug, Clone, Copy)]
    enum Operation {
        Start,
        Pause,
        Reset,
        ChangeMode(Mode),
        Reload(u64),
        Tick,
    }

    impl Operation {
        const ALL: [Self; 9] = [
            Self::Start,
            Self::Pause,
            Self::Reset,
            Self::ChangeMode(Mode::Focus),
            Self::ChangeMode(Mode::ShortBreak),
            Self::ChangeMode(Mode::LongBreak),
            Self::Reload(1),
            Self::Reload(4),
            Self::Tick,
        ];

        fn apply(self, state: &mut TimerState) {
            match self {
                Self::Start => state.start(),
                Self::Pause => state.pause(),
                Self::Reset => state.reset(),
                Self::ChangeMode(mode) => state.change_mode(mode),
                Self::Reload(focus) => {
                    state.reload_durations(ModeDurations::try_new(focus, 2, 3).unwrap())
                }
                Self::Tick => {
                    state.tick();
                }
            }
        }
    }

    fn walk(state: &TimerState, depth: usize, path: &mut Vec<Operation>) {
        if depth == 0 {
            return;
        }
        for operation in Operation::ALL {
            let mut next = state.clone();
            operation.apply(&mut next);
            path.push(operation);

            assert!(next.time_left() <= next.duration(), "{path:?}");
            assert!(next.time_left() > 0, "{path:?}");
            if next.status() == TimerStatus::Stopped {
                assert_eq!(next.time_left(), next.duration(), "{path:?}");
            }
            assert_eq!(
                next.blocking_active(),
                next.mode() == Mode::Focus && next.status() == TimerStatus::Running,
                "{path:?}"
            );

            walk(&next, depth - 1, path);
            path.pop();
        }
    }

    #[test]
    fn timer_state_bounded_along_every_sequence() {
        let state = TimerState::new(ModeDurations::try_new(3, 2, 3).unwrap());
        walk(&state, 5, &mut Vec::new());
    }

    #[test]
    fn timer_state_countdown() {
        let mut state = TimerState::new(durations());
        state.start();

        let mut completions = 0;
        for _ in 0..1500 {
            if state.tick() == TickOutcome::Completed {
                completions += 1;
            }
            assert_bounded(&state);
        }

        assert_eq!(completions, 1);
        assert_eq!(state.status(), TimerStatus::Stopped);
        assert_eq!(state.mode(), Mode::Focus);
        assert_eq!(state.time_left(), 1500);
        assert_eq!(state.duration(), 1500);
    }

    #[test]
    fn timer_state_reload_durations_running() {
        let mut state = TimerState::new(durations());
        state.start();
        for _ in 0..600 {
            state.tick();
        }
        assert_eq!(state.time_left(), 900);

        let longer = ModeDurations::try_new(1800, 300, 1800).unwrap();
        state.reload_durations(longer);
        assert_eq!(state.time_left(), 900);
        assert_eq!(state.duration(), 1500);
        assert_eq!(state.mode_durations(), &longer);

        state.pause();
        state.reload_durations(longer);
        assert_eq!(state.time_left(), 900);
        assert_eq!(state.duration(), 1500);

        state.reset();
        assert_eq!(state.time_left(), 1800);
        assert_eq!(state.duration(), 1800);
    }

    #[test]
    fn timer_state_reload_durations_stopped() {
        let mut state = TimerState::new(durations());
        state.reload_durations(ModeDurations::try_new(1800, 300, 1800).unwrap());
        assert_eq!(state.time_left(), 1800);
        assert_eq!(state.duration(), 1800);
        assert_eq!(state.status(), TimerStatus::Stopped);
    }

    #[test]
    fn timer_state_serialize() {
        let state = TimerState::new(durations());
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({
                "timeLeft": 1500,
                "duration": 1500,
                "status": "stopped",
                "mode": "focus",
                "mode_durations": {
                    "focus": 1500,
                    "short_break": 300,
                    "long_break": 1800
                }
            })
        );
    }

    #[test]
    fn timer_state_normalize() {
        let state: TimerState = serde_json::from_value(serde_json::json!({
            "timeLeft": 4000,
            "duration": 1500,
            "status": "paused",
            "mode": "focus",
            "mode_durations": { "focus": 1500, "short_break": 300, "long_break": 1800 }
        }))
        .unwrap();
        let state = state.normalize(durations());
        assert_eq!(state.time_left(), 1500);
        assert_eq!(state.status(), TimerStatus::Paused);

        let state: TimerState = serde_json::from_value(serde_json::json!({
            "timeLeft": 12,
            "duration": 1500,
            "status": "stopped",
            "mode": "long_break",
            "mode_durations": { "focus": 0, "short_break": 300, "long_break": 1800 }
        }))
        .unwrap();
        let state = state.normalize(durations());
        assert_eq!(state.mode_durations(), &durations());
        assert_eq!(state.time_left(), 1800);
        assert_eq!(state.duration(), 1800);
    }
}
