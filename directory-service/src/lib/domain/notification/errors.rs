use thiserror::Error;

/// Error for outgoing mail
#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}
