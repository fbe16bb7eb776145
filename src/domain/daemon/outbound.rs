use std::error::Error as StdError;

use snafu::prelude::*;

use crate::domain::entity::{BlockingRule, NotificationMessage, RuleId};

/// A public port for emitting a notification.
#[async_trait::async_trait]
pub trait NotifyPort: Send + Sync + 'static {
    /// Do the notification operation. This method is not intended to be
    /// implemented by adapters directly.
    ///
    /// # Errors
    ///
    /// This function will return an error if failed to make a notification.
    async fn notify(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let request = NotifyRequest {
            summary: message.summary().to_owned(),
            body: message.body().map(ToOwned::to_owned),
        };
        self.notify_impl(request).await
    }

    /// Actual implementation of notification operation.
    ///
    /// # Errors
    ///
    /// This function will return an error if failed to make a notification.
    async fn notify_impl(&self, request: NotifyRequest) -> Result<(), NotifyError>;
}

/// A structure that stores required data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    pub summary: String,
    pub body: Option<String>,
}

/// An error type of the notification operation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum NotifyError {
    #[snafu(whatever, display("Could not emit a notification: {message}"))]
    Unknown {
        message: String,
        #[snafu(source(from(Box<dyn StdError + Send + Sync>, Some)))]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

/// A public port for the platform's table of dynamic redirect rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RuleTablePort: Send + Sync + 'static {
    /// List the rules currently installed.
    ///
    /// # Errors
    ///
    /// This function will return an error if the table could not be read.
    async fn dynamic_rules(&self) -> Result<Vec<BlockingRule>, RuleTableError>;

    /// Remove the rules in `remove` and install `add` as one update.
    ///
    /// # Errors
    ///
    /// This function will return an error if the platform rejects the
    /// update.
    async fn update_dynamic_rules(
        &self,
        remove: Vec<RuleId>,
        add: Vec<BlockingRule>,
    ) -> Result<(), RuleTableError>;
}

/// An error type of accessing the rule table.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum RuleTableError {
    #[snafu(display("Rule {id} is installed twice"))]
    #[non_exhaustive]
    DuplicateId { id: RuleId },
    #[snafu(whatever, display("Rule table access failed: {message}"))]
    #[non_exhaustive]
    Unknown {
        message: String,
        #[snafu(source(from(Box<dyn StdError + Send + Sync>, Some)))]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}
