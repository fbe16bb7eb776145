use std::sync::Arc;

use snafu::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{field::Empty, Instrument, Span};

use crate::domain::daemon::broadcast::TimerEvent;
use crate::domain::daemon::inbound::TimerError;
use crate::domain::daemon::ApplicationCore;
use crate::domain::entity::Mode;
use crate::domain::repository::StorageKey;
use crate::protocol::{
    Connection, Protocol, ReceiveFrameError, Request, Response, SendFrameError,
};
use crate::tracing_report;
use crate::utils::stream::Stream;

use super::listener::{ListenError, Listener};

/// An dedicated server which listens on a UNIX socket and handles
/// requests from views.
pub struct Server {
    listener: Box<dyn Listener>,
    core: Arc<ApplicationCore>,
}

impl Server {
    /// Creates a new [`Server`].
    pub fn new(listener: Box<dyn Listener>, core: Arc<ApplicationCore>) -> Self {
        Self { listener, core }
    }

    /// Accept connections from the [`Listener`] and handle requests.
    ///
    /// # Errors
    ///
    /// This function will return an error if the server fails to accept
    /// connections.
    #[tracing::instrument(skip(self))]
    pub async fn serve(&self) -> Result<(), ServerError> {
        loop {
            let stream = match self.listener.accept().await {
                Ok(stream) => {
                    tracing::debug!("Accepted connection");
                    stream
                }
                Err(err) => {
                    tracing_report!(err);
                    return Err(err).context(ListenSnafu);
                }
            };

            let core = Arc::clone(&self.core);
            let connection = Connection::from(stream);

            let span = tracing::info_span!("handle", req = Empty).or_current();
            tokio::spawn(
                async move {
                    if let Err(err) = Self::handle(core, connection).await {
                        tracing_report!(err, "Could not handle request");
                    }
                }
                .instrument(span),
            );
        }
    }

    /// Handle the request from an accepted connection.
    ///
    /// # Errors
    ///
    /// This function will return an error if handling connection fails.
    async fn handle<S: Stream>(
        core: Arc<ApplicationCore>,
        mut connection: Connection<S>,
    ) -> Result<(), ServerError> {
        let request = match connection.receive().await {
            Ok(frame) => match Protocol::from(frame) {
                Protocol::Request(request) => request,
                protocol => {
                    reply(&mut connection, failure("Expected a request")).await?;
                    return BadRequestSnafu { protocol }.fail();
                }
            },
            Err(err @ ReceiveFrameError::Parse { .. }) => {
                reply(&mut connection, failure("Unknown request")).await?;
                return Err(err).context(ReceiveSnafu);
            }
            Err(err) => return Err(err).context(ReceiveSnafu),
        };

        Span::current().record("req", format!("{request:?}"));
        tracing::info!("Received request");

        let response = match request {
            Request::Subscribe => return Self::stream(&core, connection).await,
            request => Self::dispatch(&core, request).await,
        };
        tracing::info!("Handled request");

        reply(&mut connection, response)
            .await
            .inspect(|_| tracing::info!("Sent response"))
    }

    async fn dispatch(core: &ApplicationCore, request: Request) -> Response {
        let timer = &core.timer;
        match request {
            Request::GetCurrentState => match timer.get_state().await {
                Ok(state) => Response::State { state },
                Err(err) => timer_failure(err),
            },
            Request::StartTimer => ack(timer.start().await, "Timer started"),
            Request::StopTimer => ack(timer.pause().await, "Timer paused"),
            Request::ResetTimer => ack(timer.reset().await, "Timer reset"),
            Request::ChangeMode { new_mode } => match new_mode.parse::<Mode>() {
                Ok(mode) => ack(
                    timer.change_mode(mode).await,
                    format!("Mode changed to {new_mode}"),
                ),
                Err(err) => failure(err.to_string()),
            },
            Request::ChangeDurations => ack(timer.reload_durations().await, "Durations reloaded"),
            Request::Read { key } => match key.parse::<StorageKey>() {
                Ok(key) => match core.preference.read(key).await {
                    Ok(value) => Response::Value {
                        key: key.to_string(),
                        value,
                    },
                    Err(err) => {
                        tracing_report!(err, "Could not read preference");
                        failure(err.to_string())
                    }
                },
                Err(err) => failure(err.to_string()),
            },
            Request::Write { key, value } => match key.parse::<StorageKey>() {
                Ok(key) => match core.preference.write(key, value).await {
                    Ok(()) => Response::Ack {
                        reply: format!("Updated {key}"),
                    },
                    Err(err) => {
                        tracing::warn!(%err, "Rejected preference");
                        failure(err.to_string())
                    }
                },
                Err(err) => failure(err.to_string()),
            },
            Request::Subscribe => failure("Subscription must be the only request"),
        }
    }

    /// Reply with the current state, then forward every [`TimerEvent`] until
    /// the peer closes the connection.
    async fn stream<S: Stream>(
        core: &ApplicationCore,
        mut connection: Connection<S>,
    ) -> Result<(), ServerError> {
        let mut events = core.subscribe.subscribe();
        let response = match core.timer.get_state().await {
            Ok(state) => Response::State { state },
            Err(err) => {
                let response = timer_failure(err);
                return reply(&mut connection, response).await;
            }
        };
        reply(&mut connection, response).await?;
        tracing::info!("Subscribed");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(TimerEvent::TimerUpdate(state)) => {
                        reply(&mut connection, Response::TimerUpdate { state }).await?;
                    }
                    Ok(TimerEvent::SessionComplete { mode }) => {
                        reply(&mut connection, Response::SessionComplete { mode }).await?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Subscriber lagged behind");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                frame = connection.receive() => match frame {
                    Ok(frame) => tracing::debug!(?frame, "Ignored frame from subscriber"),
                    Err(ReceiveFrameError::Closed) => {
                        tracing::info!("Unsubscribed");
                        return Ok(());
                    }
                    Err(err) => return Err(err).context(ReceiveSnafu),
                },
            }
        }
    }
}

async fn reply<S: Stream>(
    connection: &mut Connection<S>,
    response: Response,
) -> Result<(), ServerError> {
    connection
        .send(Protocol::Response(response).into())
        .await
        .context(SendSnafu)
}

fn failure(reason: impl Into<String>) -> Response {
    Response::Failure {
        reason: reason.into(),
    }
}

fn timer_failure(err: TimerError) -> Response {
    tracing_report!(err, "Timer request failed");
    failure(err.to_string())
}

fn ack(result: Result<(), TimerError>, reply: impl Into<String>) -> Response {
    match result {
        Ok(()) => Response::Ack {
            reply: reply.into(),
        },
        Err(err) => timer_failure(err),
    }
}

/// An error type for server.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ServerError {
    #[snafu(display("Could not accept a connection"))]
    Listen { source: ListenError },
    #[snafu(display("Could not receive a request"))]
    Receive { source: ReceiveFrameError },
    #[snafu(display("Could not handle {protocol:?}"))]
    BadRequest { protocol: Protocol },
    #[snafu(display("Could not send a response"))]
    Send { source: SendFrameError },
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::{BufMut, BytesMut};
    use serde_json::json;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::sync::broadcast::{self, Sender};

    use crate::daemon::app::DuplexListener;
    use crate::domain::daemon::inbound::{
        MockPreferencePort, MockShutdownPort, MockSubscribePort, MockTimerPort, PreferenceError,
    };
    use crate::domain::daemon::worker::WorkerGoneError;
    use crate::domain::entity::{ModeDurations, TimerState};

    fn state() -> TimerState {
        TimerState::new(ModeDurations::default())
    }

    fn new_core(timer: MockTimerPort, preference: MockPreferencePort) -> Arc<ApplicationCore> {
        let (events, _) = broadcast::channel(8);
        new_core_with(timer, preference, events)
    }

    fn new_core_with(
        timer: MockTimerPort,
        preference: MockPreferencePort,
        events: Sender<crate::domain::daemon::broadcast::TimerEvent>,
    ) -> Arc<ApplicationCore> {
        let mut subscribe = MockSubscribePort::new();
        subscribe
            .expect_subscribe()
            .returning(move || events.subscribe());

        Arc::new(ApplicationCore {
            timer: Arc::new(timer),
            subscribe: Arc::new(subscribe),
            preference: Arc::new(preference),
            shutdown: Arc::new(MockShutdownPort::new()),
        })
    }

    async fn request(core: Arc<ApplicationCore>, request: Request) -> Response {
        let (connection, mut client) = new_connection_with(Protocol::Request(request)).await;
        assert!(Server::handle(core, connection).await.is_ok());
        match Protocol::from(client.receive().await.unwrap()) {
            Protocol::Response(response) => response,
            protocol => panic!("unexpected {protocol:?}"),
        }
    }

    #[tokio::test]
    async fn server_handle_timer() {
        let mut timer = MockTimerPort::new();
        timer.expect_get_state().returning(|| Ok(state()));
        timer.expect_start().times(1).returning(|| Ok(()));
        timer.expect_pause().times(1).returning(|| Ok(()));
        timer.expect_reset().times(1).returning(|| Ok(()));
        timer
            .expect_change_mode()
            .withf(|mode| *mode == Mode::LongBreak)
            .times(1)
            .returning(|_| Ok(()));
        timer.expect_reload_durations().times(1).returning(|| Ok(()));
        let core = new_core(timer, MockPreferencePort::new());

        assert_eq!(
            request(Arc::clone(&core), Request::GetCurrentState).await,
            Response::State { state: state() }
        );
        for (req, reply) in [
            (Request::StartTimer, "Timer started"),
            (Request::StopTimer, "Timer paused"),
            (Request::ResetTimer, "Timer reset"),
            (
                Request::ChangeMode {
                    new_mode: "long_break".to_owned(),
                },
                "Mode changed to long_break",
            ),
            (Request::ChangeDurations, "Durations reloaded"),
        ] {
            assert_eq!(
                request(Arc::clone(&core), req).await,
                Response::Ack {
                    reply: reply.to_owned()
                }
            );
        }
    }

    #[tokio::test]
    async fn server_handle_failure() {
        let mut timer = MockTimerPort::new();
        timer
            .expect_start()
            .returning(|| Err(TimerError::Gone { source: WorkerGoneError }));
        timer.expect_change_mode().never();
        let core = new_core(timer, MockPreferencePort::new());

        assert!(matches!(
            request(Arc::clone(&core), Request::StartTimer).await,
            Response::Failure { .. }
        ));
        assert_eq!(
            request(
                Arc::clone(&core),
                Request::ChangeMode {
                    new_mode: "coffee".to_owned()
                }
            )
            .await,
            Response::Failure {
                reason: "Unknown mode key \"coffee\"".to_owned()
            }
        );
        assert!(matches!(
            request(
                core,
                Request::Read {
                    key: "cookies".to_owned()
                }
            )
            .await,
            Response::Failure { .. }
        ));
    }

    #[tokio::test]
    async fn server_handle_preference() {
        let mut preference = MockPreferencePort::new();
        preference
            .expect_read()
            .withf(|key| *key == StorageKey::Theme)
            .returning(|_| Ok(Some(json!("digital"))));
        preference
            .expect_write()
            .withf(|key, _| *key == StorageKey::BlockedSites)
            .times(1)
            .returning(|_, _| Ok(()));
        preference
            .expect_write()
            .withf(|key, _| *key == StorageKey::TimerState)
            .returning(|key, _| Err(PreferenceError::ReadOnly { key }));
        let core = new_core(MockTimerPort::new(), preference);

        assert_eq!(
            request(
                Arc::clone(&core),
                Request::Read {
                    key: "theme".to_owned()
                }
            )
            .await,
            Response::Value {
                key: "theme".to_owned(),
                value: Some(json!("digital")),
            }
        );
        assert_eq!(
            request(
                Arc::clone(&core),
                Request::Write {
                    key: "blockedSites".to_owned(),
                    value: json!(["youtube.com"]),
                }
            )
            .await,
            Response::Ack {
                reply: "Updated blockedSites".to_owned()
            }
        );
        assert!(matches!(
            request(
                core,
                Request::Write {
                    key: "timerState".to_owned(),
                    value: json!({}),
                }
            )
            .await,
            Response::Failure { .. }
        ));
    }

    #[tokio::test]
    async fn server_handle_unknown_request() {
        let core = new_core(MockTimerPort::new(), MockPreferencePort::new());
        let (server, mut client_stream) = tokio::io::duplex(1024);

        let payload = br#"{"type":"Request","method":"SKIP"}"#;
        let mut raw = BytesMut::new();
        raw.put_u8(b'+');
        raw.put_u64(payload.len() as u64);
        raw.put_slice(payload);
        client_stream.write_all(&raw).await.unwrap();

        assert!(matches!(
            Server::handle(core, Connection::from(server)).await,
            Err(ServerError::Receive { .. })
        ));
        let mut client = Connection::from(client_stream);
        assert_eq!(
            client.receive().await.unwrap(),
            Protocol::Response(Response::Failure {
                reason: "Unknown request".to_owned()
            })
            .into()
        );
    }

    #[tokio::test]
    async fn server_handle_error_bad_request() {
        let core = new_core(MockTimerPort::new(), MockPreferencePort::new());
        let protocol = Protocol::Response(Response::Ack {
            reply: "Timer started".to_owned(),
        });
        let (connection, _client) = new_connection_with(protocol.clone()).await;
        assert!(matches!(
            Server::handle(core, connection).await,
            Err(ServerError::BadRequest { protocol: p }) if p == protocol
        ));
    }

    #[tokio::test]
    async fn server_handle_error_send() {
        let mut timer = MockTimerPort::new();
        timer.expect_pause().returning(|| Ok(()));
        let core = new_core(timer, MockPreferencePort::new());
        let (connection, client) = new_connection_with(Protocol::Request(Request::StopTimer)).await;
        drop(client);
        assert!(matches!(
            Server::handle(core, connection).await,
            Err(ServerError::Send { .. }),
        ));
    }

    #[tokio::test]
    async fn server_handle_subscribe() {
        let mut timer = MockTimerPort::new();
        timer.expect_get_state().returning(|| Ok(state()));
        let (events, _) = broadcast::channel(8);
        let core = new_core_with(timer, MockPreferencePort::new(), events.clone());

        let (connection, mut client) =
            new_connection_with(Protocol::Request(Request::Subscribe)).await;
        let handle = tokio::spawn(Server::handle(core, connection));

        assert_eq!(
            client.receive().await.unwrap(),
            Protocol::Response(Response::State { state: state() }).into()
        );

        let mut running = state();
        running.start();
        events
            .send(TimerEvent::TimerUpdate(running.clone()))
            .unwrap();
        events
            .send(TimerEvent::SessionComplete { mode: Mode::Focus })
            .unwrap();

        assert_eq!(
            client.receive().await.unwrap(),
            Protocol::Response(Response::TimerUpdate { state: running }).into()
        );
        assert_eq!(
            client.receive().await.unwrap(),
            Protocol::Response(Response::SessionComplete { mode: Mode::Focus }).into()
        );

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn server_serve() {
        let mut timer = MockTimerPort::new();
        timer.expect_reset().returning(|| Ok(()));
        let core = new_core(timer, MockPreferencePort::new());
        let (listener, mut peers) = DuplexListener::new(1024);
        let server = Server::new(Box::new(listener), core);
        tokio::spawn(async move { server.serve().await });

        for _ in 0..2 {
            let mut client = Connection::from(peers.recv().await.unwrap());
            client
                .send(Protocol::Request(Request::ResetTimer).into())
                .await
                .unwrap();
            assert_eq!(
                client.receive().await.unwrap(),
                Protocol::Response(Response::Ack {
                    reply: "Timer reset".to_owned()
                })
                .into()
            );
        }
    }

    async fn new_connection_with(
        data_recv: Protocol,
    ) -> (Connection<DuplexStream>, Connection<DuplexStream>) {
        let (server, client) = tokio::io::duplex(1024);
        let server = Connection::from(server);
        let mut client = Connection::from(client);
        client.send(data_recv.into()).await.unwrap();
        (server, client)
    }
}
