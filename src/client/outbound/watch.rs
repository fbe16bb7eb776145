use std::sync::Arc;

use futures::StreamExt;
use snafu::prelude::*;

use crate::client::app::connector::Connector;
use crate::domain::client::outbound::{
    BadResponseSnafu, RejectedSnafu, RequestDaemonError, WatchEvent, WatchPort, WatchStream,
};
use crate::protocol::{Protocol, ReceiveFrameError, Request, Response};

use super::request::{open, DaemonConnection};

/// A [`WatchPort`] implementation which keeps a `SUBSCRIBE` connection open.
pub struct WatchService {
    connector: Arc<dyn Connector>,
}

impl WatchService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait::async_trait]
impl WatchPort for WatchService {
    async fn watch(&self) -> Result<WatchStream, RequestDaemonError> {
        let connection = open(self.connector.as_ref(), Request::Subscribe).await?;
        Ok(futures::stream::unfold(Some(connection), next_event).boxed())
    }
}

/// Read the next event. The stream stops after the daemon closes the
/// connection or after the first error.
async fn next_event(
    connection: Option<DaemonConnection>,
) -> Option<(Result<WatchEvent, RequestDaemonError>, Option<DaemonConnection>)> {
    let mut connection = connection?;

    let frame = match connection.receive().await {
        Ok(frame) => frame,
        Err(ReceiveFrameError::Closed) => return None,
        Err(err) => return Some((Err(err).whatever_context("Could not receive event"), None)),
    };

    let event = match Protocol::from(frame) {
        Protocol::Response(Response::State { state } | Response::TimerUpdate { state }) => {
            WatchEvent::State(state)
        }
        Protocol::Response(Response::SessionComplete { mode }) => WatchEvent::SessionComplete(mode),
        Protocol::Response(Response::Failure { reason }) => {
            return Some((RejectedSnafu { reason }.fail(), None))
        }
        _ => return Some((BadResponseSnafu.fail(), None)),
    };

    Some((Ok(event), Some(connection)))
}
