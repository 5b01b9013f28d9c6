use async_trait::async_trait;

use crate::domain::notification::errors::EmailError;

/// Outgoing mail.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Send an HTML mail.
    ///
    /// # Arguments
    /// * `to` - Recipient address
    /// * `subject` - Subject line
    /// * `body` - HTML body
    ///
    /// # Errors
    /// * `InvalidAddress` - Sender or recipient is not a mail address
    /// * `Transport` - Mail server refused or was unreachable
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}
