use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::events::errors::HandlerError;
use crate::domain::events::models::Delivery;
use crate::domain::events::ports::NotificationHandler;
use crate::domain::notification::ports::EmailSender;

pub const NOTIFICATION_SUBJECT: &str = "Directory Event Notification";

/// Mails every consumed event to a fixed recipient.
pub struct EmailNotificationHandler<ES>
where
    ES: EmailSender + ?Sized,
{
    sender: Arc<ES>,
    recipient: String,
}

impl<ES> EmailNotificationHandler<ES>
where
    ES: EmailSender + ?Sized,
{
    pub fn new(sender: Arc<ES>, recipient: impl Into<String>) -> Self {
        Self {
            sender,
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl<ES> NotificationHandler for EmailNotificationHandler<ES>
where
    ES: EmailSender + ?Sized,
{
    async fn handle(&self, delivery: &Delivery) -> Result<(), HandlerError> {
        let body = delivery.text().ok_or(HandlerError::InvalidPayload)?;

        tracing::debug!(
            routing_key = %delivery.routing_key,
            partition = delivery.tag.partition,
            offset = delivery.tag.offset,
            redelivered = delivery.redelivered,
            "Mailing event notification"
        );

        self.sender
            .send(&self.recipient, NOTIFICATION_SUBJECT, body)
            .await
            .map_err(|e| HandlerError::DeliveryFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::events::models::DeliveryTag;
    use crate::domain::notification::errors::EmailError;

    mock! {
        pub TestEmailSender {}

        #[async_trait]
        impl EmailSender for TestEmailSender {
            async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
        }
    }

    fn delivery(payload: &[u8]) -> Delivery {
        Delivery {
            routing_key: "directory".to_string(),
            payload: payload.to_vec(),
            tag: DeliveryTag {
                partition: 0,
                offset: 7,
            },
            redelivered: false,
        }
    }

    #[tokio::test]
    async fn test_handle_mails_payload_to_recipient() {
        let mut sender = MockTestEmailSender::new();
        sender
            .expect_send()
            .withf(|to, subject, body| {
                to == "audit@example.com"
                    && subject == NOTIFICATION_SUBJECT
                    && body == "User Registered: alice@example.com"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let handler = EmailNotificationHandler::new(Arc::new(sender), "audit@example.com");

        let result = handler
            .handle(&delivery(b"User Registered: alice@example.com"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_mail_failure_is_handler_failure() {
        let mut sender = MockTestEmailSender::new();
        sender
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(EmailError::Transport("connection refused".to_string())));

        let handler = EmailNotificationHandler::new(Arc::new(sender), "audit@example.com");

        let result = handler.handle(&delivery(b"Contact Added")).await;
        assert!(matches!(result, Err(HandlerError::DeliveryFailed(_))));
    }

    #[tokio::test]
    async fn test_binary_payload_rejected() {
        let mut sender = MockTestEmailSender::new();
        sender.expect_send().times(0);

        let handler = EmailNotificationHandler::new(Arc::new(sender), "audit@example.com");

        let result = handler.handle(&delivery(&[0xc3, 0x28])).await;
        assert!(matches!(result, Err(HandlerError::InvalidPayload)));
    }
}
