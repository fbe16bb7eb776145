use snafu::prelude::*;

use crate::client::app::connector::{ConnectError, Connector};
use crate::domain::client::outbound::{
    BadResponseSnafu, RejectedSnafu, RequestDaemonError, UnavailableSnafu,
};
use crate::protocol::{Connection, Protocol, Request, Response};
use crate::utils::stream::Stream;

pub(super) type DaemonConnection = Connection<Box<dyn Stream>>;

/// Connect to the daemon and send `request` without waiting for a reply.
pub(super) async fn open(
    connector: &dyn Connector,
    request: Request,
) -> Result<DaemonConnection, RequestDaemonError> {
    let stream = match connector.connect().await {
        Ok(stream) => stream,
        Err(err) => match err {
            ConnectError::Unavailable { endpoint } => return UnavailableSnafu { endpoint }.fail(),
            err => return Err(err).whatever_context("Could not connect"),
        },
    };

    let mut connection = Connection::from(stream);
    connection
        .send(Protocol::Request(request).into())
        .await
        .whatever_context("Could not send request")?;
    Ok(connection)
}

/// Send `request` and wait for the single response. A `FAILURE` response
/// becomes [`RequestDaemonError::Rejected`].
pub(super) async fn request(
    connector: &dyn Connector,
    request: Request,
) -> Result<Response, RequestDaemonError> {
    let mut connection = open(connector, request).await?;

    let response: Protocol = connection
        .receive()
        .await
        .whatever_context("Could not receive response")?
        .into();

    match response {
        Protocol::Response(Response::Failure { reason }) => RejectedSnafu { reason }.fail(),
        Protocol::Response(response) => Ok(response),
        Protocol::Request(_) => BadResponseSnafu.fail(),
    }
}

/// Send `request` and expect an `ACK`, returning its reply text.
pub(super) async fn acknowledge(
    connector: &dyn Connector,
    req: Request,
) -> Result<String, RequestDaemonError> {
    match request(connector, req).await? {
        Response::Ack { reply } => Ok(reply),
        _ => BadResponseSnafu.fail(),
    }
}
