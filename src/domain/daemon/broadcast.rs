use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::domain::entity::{Mode, TimerState};

/// Events pushed to every listening view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The state after a mutation or a tick.
    TimerUpdate(TimerState),
    /// A session of the given mode counted down to zero.
    SessionComplete { mode: Mode },
}

/// Fire-and-forget fan-out of [`TimerEvent`]s. Sending never fails from the
/// caller's point of view: with no listener the event is dropped.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: Sender<TimerEvent>,
}

impl Broadcaster {
    /// Creates a new [`Broadcaster`] buffering up to `capacity` events per
    /// listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: TimerEvent) {
        if let Ok(listeners) = self.sender.send(event) {
            tracing::trace!(listeners, "Broadcast event");
        }
    }

    pub fn subscribe(&self) -> Receiver<TimerEvent> {
        self.sender.subscribe()
    }
}
