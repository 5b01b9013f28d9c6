use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::EmailConfig;
use crate::domain::notification::errors::EmailError;
use crate::domain::notification::ports::EmailSender;

/// SMTP mail adapter.
///
/// Uses STARTTLS when `enable_ssl` is set, plain SMTP otherwise (local relays).
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailSender {
    /// Build the transport from configuration. Does not connect.
    ///
    /// # Errors
    /// * `InvalidAddress` - Sender address does not parse
    /// * `Transport` - TLS setup for the relay failed
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let sender: Mailbox = config
            .sender_email
            .parse()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {}", config.sender_email, e)))?;

        let builder = if config.enable_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .map_err(|e| EmailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };

        let builder = builder.port(config.port);
        let transport = if config.sender_password.is_empty() {
            builder.build()
        } else {
            builder
                .credentials(Credentials::new(
                    config.sender_email.clone(),
                    config.sender_password.clone(),
                ))
                .build()
        };

        tracing::info!(
            smtp_server = %config.smtp_server,
            port = config.port,
            starttls = config.enable_ssl,
            "SMTP transport configured"
        );

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        tracing::debug!(to, subject, "Mail sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sender_email: &str) -> EmailConfig {
        EmailConfig {
            smtp_server: "localhost".to_string(),
            port: 1025,
            sender_email: sender_email.to_string(),
            sender_password: String::new(),
            enable_ssl: false,
            notification_recipient: "ops@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_sender() {
        let result = SmtpEmailSender::new(&config("not-an-address"));
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_recipient_before_connecting() {
        let sender = SmtpEmailSender::new(&config("noreply@example.com")).unwrap();

        let result = sender.send("nobody", "Subject", "<p>Body</p>").await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
