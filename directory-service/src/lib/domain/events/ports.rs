use async_trait::async_trait;

use crate::domain::events::errors::EventPublisherError;
use crate::domain::events::errors::HandlerError;
use crate::domain::events::models::Delivery;

/// Publishes raw messages to the configured exchange.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Publish one message.
    ///
    /// Declares the exchange, queue and binding on first use.
    ///
    /// # Arguments
    /// * `message` - Payload bytes
    /// * `routing_key` - Key the exchange routes on
    ///
    /// # Errors
    /// * `TopologyFailed` - Exchange or queue could not be declared
    /// * `PublishFailed` - Broker rejected the message
    /// * `ConnectionFailed` - Broker unreachable
    /// * `Timeout` - Publishing timed out
    async fn publish(&self, message: &[u8], routing_key: &str) -> Result<(), EventPublisherError>;
}

/// Side effect run for every consumed message.
///
/// A message is acknowledged only after `handle` returns `Ok`, so
/// implementations must tolerate seeing the same message twice.
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    async fn handle(&self, delivery: &Delivery) -> Result<(), HandlerError>;
}
