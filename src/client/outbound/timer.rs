use std::sync::Arc;

use crate::client::app::connector::Connector;
use crate::domain::client::outbound::{BadResponseSnafu, RequestDaemonError, TimerCommandPort};
use crate::domain::entity::{Mode, TimerState};
use crate::protocol::{Request, Response};

use super::request::{acknowledge, request};

/// A [`TimerCommandPort`] implementation which sends one request per
/// connection.
pub struct TimerService {
    connector: Arc<dyn Connector>,
}

impl TimerService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait::async_trait]
impl TimerCommandPort for TimerService {
    async fn get_state(&self) -> Result<TimerState, RequestDaemonError> {
        match request(self.connector.as_ref(), Request::GetCurrentState).await? {
            Response::State { state } => Ok(state),
            _ => BadResponseSnafu.fail(),
        }
    }

    async fn start(&self) -> Result<String, RequestDaemonError> {
        acknowledge(self.connector.as_ref(), Request::StartTimer).await
    }

    async fn pause(&self) -> Result<String, RequestDaemonError> {
        acknowledge(self.connector.as_ref(), Request::StopTimer).await
    }

    async fn reset(&self) -> Result<String, RequestDaemonError> {
        acknowledge(self.connector.as_ref(), Request::ResetTimer).await
    }

    async fn change_mode(&self, mode: Mode) -> Result<String, RequestDaemonError> {
        let request = Request::ChangeMode {
            new_mode: mode.key().to_owned(),
        };
        acknowledge(self.connector.as_ref(), request).await
    }

    async fn change_durations(&self) -> Result<String, RequestDaemonError> {
        acknowledge(self.connector.as_ref(), Request::ChangeDurations).await
    }
}
