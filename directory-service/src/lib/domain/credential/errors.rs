use auth::PasswordError;
use thiserror::Error;

use crate::domain::cache::CacheError;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for FullName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FullNameError {
    #[error("Full name must not be empty")]
    Empty,

    #[error("Full name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),

    #[error("Email too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Top-level error for registration, login and password reset
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid full name: {0}")]
    InvalidFullName(#[from] FullNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password must not be empty")]
    EmptyPassword,

    // Domain-level errors
    #[error("User with this email already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Email not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PasswordError> for CredentialError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::EmptyPassword => CredentialError::EmptyPassword,
            PasswordError::HashingFailed(msg) => CredentialError::Unknown(msg),
        }
    }
}

impl From<CacheError> for CredentialError {
    fn from(err: CacheError) -> Self {
        CredentialError::Unavailable(err.to_string())
    }
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        CredentialError::Unknown(err.to_string())
    }
}
