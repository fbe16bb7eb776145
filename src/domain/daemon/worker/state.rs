use tokio::time::{Duration, Interval, MissedTickBehavior};

use crate::domain::daemon::worker::handle::Command;
use crate::domain::daemon::worker::routine::WorkerContext;
use crate::domain::entity::{TickOutcome, TimerStatus};

/// Period of the countdown.
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
#[repr(transparent)]
pub struct WorkerState {
    inner: Option<WorkerStateInner>,
}

impl WorkerState {
    /// Creates the [`WorkerState`] matching a timer status. A running timer
    /// gets a fresh countdown.
    pub async fn enter(status: TimerStatus) -> Self {
        Self {
            inner: Some(WorkerStateInner::enter(status).await),
        }
    }

    /// Do the business logic based on its inner state.
    pub async fn run(&mut self, context: &mut WorkerContext) {
        self.inner = match self.inner.take() {
            Some(inner) => Some(inner.run(context).await),
            None => unreachable!("`WorkerState`'s inner should not be `None`"),
        };
    }

    /// Returns `true` if the worker should stop running.
    pub fn is_terminated(&self) -> bool {
        matches!(self.inner, Some(WorkerStateInner::Terminated(_)))
    }
}

#[enum_dispatch::enum_dispatch]
trait StateRun {
    async fn run(self, context: &mut WorkerContext) -> WorkerStateInner;
}

/// Actual implementation of running state of [`WorkerRoutine`].
///
/// [`WorkerRoutine`]: super::routine::WorkerRoutine
#[derive(Debug)]
#[enum_dispatch::enum_dispatch(StateRun)]
enum WorkerStateInner {
    Stopped(StoppedState),
    Running(RunningState),
    Paused(PausedState),
    Terminated(TerminatedState),
}

impl WorkerStateInner {
    async fn enter(status: TimerStatus) -> Self {
        match status {
            TimerStatus::Stopped => StoppedState.into(),
            TimerStatus::Paused => PausedState.into(),
            TimerStatus::Running => RunningState {
                ticker: spawn_ticker().await,
            }
            .into(),
        }
    }
}

/// What the worker does after handling a command.
enum Next {
    /// The status did not change, keep the current state and its countdown.
    Keep,
    /// Enter the state matching the new status, dropping any countdown.
    Enter(TimerStatus),
    Terminate,
}

/// Apply one command to the timer. Every mutation is followed by a sync.
async fn handle_command(context: &mut WorkerContext, command: Command) -> Next {
    tracing::debug!(?command, "Handling command");

    match command {
        Command::Query { responder } => {
            let _ = responder.send(context.timer.clone());
            Next::Keep
        }
        Command::Start => {
            context.timer.start();
            context.sync().await;
            Next::Enter(context.timer.status())
        }
        Command::Pause => {
            context.timer.pause();
            context.sync().await;
            Next::Enter(context.timer.status())
        }
        Command::Reset => {
            context.timer.reset();
            context.sync().await;
            Next::Enter(context.timer.status())
        }
        Command::ChangeMode(mode) => {
            context.timer.change_mode(mode);
            context.sync().await;
            Next::Enter(context.timer.status())
        }
        Command::ReloadDurations(durations) => {
            context.timer.reload_durations(durations);
            context.sync().await;
            Next::Keep
        }
        Command::UpdateBlockedSites(sites) => {
            context.sites = sites;
            context.update_blocking().await;
            Next::Keep
        }
        Command::Shutdown { responder } => {
            context.persist().await;
            let _ = responder.send(());
            Next::Terminate
        }
    }
}

async fn transition<S>(state: S, next: Next) -> WorkerStateInner
where
    S: Into<WorkerStateInner>,
{
    match next {
        Next::Keep => state.into(),
        Next::Enter(status) => {
            drop(state);
            WorkerStateInner::enter(status).await
        }
        Next::Terminate => TerminatedState.into(),
    }
}

/// A state which indicates that the timer is stopped at its full duration.
#[derive(Debug)]
struct StoppedState;

impl StateRun for StoppedState {
    async fn run(self, context: &mut WorkerContext) -> WorkerStateInner {
        match context.commands.recv().await {
            Some(command) => {
                let next = handle_command(context, command).await;
                transition(self, next).await
            }
            None => TerminatedState.into(),
        }
    }
}

/// A state which indicates that the timer is counting down. The ticker is
/// owned here, so leaving this state always cancels the countdown.
#[derive(Debug)]
struct RunningState {
    ticker: Interval,
}

impl StateRun for RunningState {
    async fn run(mut self, context: &mut WorkerContext) -> WorkerStateInner {
        tokio::select! {
            _ = self.ticker.tick() => self.handle_tick(context).await,
            command = context.commands.recv() => match command {
                Some(command) => {
                    let next = handle_command(context, command).await;
                    transition(self, next).await
                }
                None => TerminatedState.into(),
            },
        }
    }
}

impl RunningState {
    async fn handle_tick(self, context: &mut WorkerContext) -> WorkerStateInner {
        let mode = context.timer.mode();
        match context.timer.tick() {
            TickOutcome::Elapsed => {
                context.sync().await;
                self.into()
            }
            TickOutcome::Completed => {
                context.sync().await;
                context.complete(mode).await;
                StoppedState.into()
            }
            TickOutcome::Idle => transition(self, Next::Enter(context.timer.status())).await,
        }
    }
}

/// A state which indicates that the countdown is suspended with its
/// remaining time frozen.
#[derive(Debug)]
struct PausedState;

impl StateRun for PausedState {
    async fn run(self, context: &mut WorkerContext) -> WorkerStateInner {
        match context.commands.recv().await {
            Some(command) => {
                let next = handle_command(context, command).await;
                transition(self, next).await
            }
            None => TerminatedState.into(),
        }
    }
}

/// A state which indicates that the worker should stop running.
#[derive(Debug)]
struct TerminatedState;

impl StateRun for TerminatedState {
    async fn run(self, _context: &mut WorkerContext) -> WorkerStateInner {
        self.into()
    }
}

async fn spawn_ticker() -> Interval {
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::Instant;

    use crate::domain::daemon::testing::{self, Fixture};
    use crate::domain::entity::{Mode, TimerState};

    #[tokio::test(start_paused = true)]
    async fn ticker_operation() {
        let start = Instant::now();
        let mut ticker = spawn_ticker().await;
        let now = ticker.tick().await;
        assert_eq!(now - start, TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn running_state_handle_tick() {
        let fixture = Fixture::new();
        let (_, mut context) = fixture.context(TimerState::new(testing::durations()));
        context.timer.start();

        let state = RunningState {
            ticker: spawn_ticker().await,
        };
        let state = state.handle_tick(&mut context).await;

        assert!(matches!(state, WorkerStateInner::Running(_)));
        assert_eq!(context.timer.time_left(), 1499);
        assert_eq!(fixture.stored_timer().unwrap(), context.timer);
        assert!(fixture.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn running_state_handle_tick_complete() {
        let fixture = Fixture::new();
        let (_, mut context) = fixture.context(TimerState::new(testing::durations()));
        context.timer.change_mode(Mode::ShortBreak);
        context.timer.start();
        for _ in 0..299 {
            context.timer.tick();
        }
        assert_eq!(context.timer.time_left(), 1);

        let state = RunningState {
            ticker: spawn_ticker().await,
        };
        let state = state.handle_tick(&mut context).await;

        assert!(matches!(state, WorkerStateInner::Stopped(_)));
        assert_eq!(context.timer.status(), TimerStatus::Stopped);
        assert_eq!(context.timer.time_left(), 300);
        assert_eq!(fixture.notifications().len(), 1);
        assert_eq!(
            fixture.notifications()[0].summary,
            "Short break is over".to_owned()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn running_state_handle_query_keeps_ticker() {
        let fixture = Fixture::new();
        let (_, mut context) = fixture.context(TimerState::new(testing::durations()));
        context.timer.start();

        let (responder, receiver) = tokio::sync::oneshot::channel();
        let next = handle_command(&mut context, Command::Query { responder }).await;
        assert!(matches!(next, Next::Keep));
        assert_eq!(receiver.await.unwrap(), context.timer);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_state_handle_start() {
        let fixture = Fixture::new();
        let (_, mut context) = fixture.context(TimerState::new(testing::durations()));
        context.timer.start();
        context.timer.tick();
        context.timer.pause();

        let next = handle_command(&mut context, Command::Start).await;
        let state = transition(PausedState, next).await;

        assert!(matches!(state, WorkerStateInner::Running(_)));
        assert_eq!(context.timer.time_left(), 1499);
        assert_eq!(context.timer.status(), TimerStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_state_handle_shutdown() {
        let fixture = Fixture::new();
        let (_, mut context) = fixture.context(TimerState::new(testing::durations()));

        let (responder, receiver) = tokio::sync::oneshot::channel();
        let next = handle_command(&mut context, Command::Shutdown { responder }).await;
        let state = transition(StoppedState, next).await;

        assert!(matches!(state, WorkerStateInner::Terminated(_)));
        assert!(receiver.await.is_ok());
        assert_eq!(fixture.stored_timer().unwrap(), context.timer);
    }
}
