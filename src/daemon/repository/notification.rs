use std::sync::Arc;

use crate::config::Configuration;
use crate::domain::entity::{Mode, NotificationMessage};
use crate::domain::repository::{GetNotificationError, NotificationRepository};

/// A [`NotificationRepository`] implementation which reads configuration files.
pub struct NotificationConfiguration {
    config: Arc<Configuration>,
}

impl NotificationConfiguration {
    /// Creates a new [`NotificationConfiguration`].
    pub fn new(config: Arc<Configuration>) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl NotificationRepository for NotificationConfiguration {
    async fn completion_message(
        &self,
        mode: Mode,
    ) -> Result<NotificationMessage, GetNotificationError> {
        self.config
            .notification
            .message(mode)
            .map_err(|err| GetNotificationError::Invalid { source: err })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{MessageSection, NotificationSection};

    #[tokio::test]
    async fn notification_configuration_completion_message() {
        let config = Configuration {
            notification: NotificationSection {
                long_break: Some(MessageSection {
                    summary: "Break is over".to_owned(),
                    body: None,
                }),
                focus: Some(MessageSection {
                    summary: String::new(),
                    body: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let repository = NotificationConfiguration::new(Arc::new(config));

        let message = repository.completion_message(Mode::LongBreak).await.unwrap();
        assert_eq!(message.summary(), "Break is over");
        assert_eq!(
            repository.completion_message(Mode::ShortBreak).await.unwrap(),
            NotificationMessage::completed(Mode::ShortBreak)
        );
        assert!(matches!(
            repository.completion_message(Mode::Focus).await,
            Err(GetNotificationError::Invalid { .. })
        ));
    }
}
