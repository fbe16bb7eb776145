use std::sync::Arc;

use serde_json::Value;

use crate::client::app::connector::Connector;
use crate::domain::client::outbound::{
    BadResponseSnafu, PreferenceClientPort, RequestDaemonError,
};
use crate::domain::repository::StorageKey;
use crate::protocol::{Request, Response};

use super::request::{acknowledge, request};

/// A [`PreferenceClientPort`] implementation which goes through the
/// daemon's `READ` and `WRITE` requests.
pub struct PreferenceService {
    connector: Arc<dyn Connector>,
}

impl PreferenceService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait::async_trait]
impl PreferenceClientPort for PreferenceService {
    async fn read(&self, key: StorageKey) -> Result<Option<Value>, RequestDaemonError> {
        let req = Request::Read {
            key: key.to_string(),
        };
        match request(self.connector.as_ref(), req).await? {
            Response::Value { key: got, value } if got == key.as_str() => Ok(value),
            _ => BadResponseSnafu.fail(),
        }
    }

    async fn write(&self, key: StorageKey, value: Value) -> Result<String, RequestDaemonError> {
        let req = Request::Write {
            key: key.to_string(),
            value,
        };
        acknowledge(self.connector.as_ref(), req).await
    }
}
