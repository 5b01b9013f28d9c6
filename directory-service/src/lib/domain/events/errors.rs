use thiserror::Error;

/// Error for event publishing operations
#[derive(Debug, Clone, Error)]
pub enum EventPublisherError {
    #[error("Failed to declare broker topology: {0}")]
    TopologyFailed(String),

    #[error("Failed to publish event to broker: {0}")]
    PublishFailed(String),

    #[error("Connection to event broker failed: {0}")]
    ConnectionFailed(String),

    #[error("Event publishing timeout: {0}")]
    Timeout(String),
}

/// Error returned by a notification handler for one delivery
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("Message payload is not valid UTF-8")]
    InvalidPayload,

    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),
}
