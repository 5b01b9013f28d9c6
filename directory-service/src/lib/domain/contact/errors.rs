use thiserror::Error;

use crate::credential::errors::EmailError;

/// Error for ContactId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContactIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for ContactName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContactNameError {
    #[error("Name must not be empty")]
    Empty,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for PhoneNumber validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("Phone number must contain between {min} and {max} digits, got {actual}")]
    DigitCount {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Phone number contains invalid characters (only digits, spaces, '+', '-', '(' and ')' allowed)")]
    InvalidCharacters,
}

/// Top-level error for all contact operations
#[derive(Debug, Clone, Error)]
pub enum ContactError {
    #[error("Invalid contact ID: {0}")]
    InvalidContactId(#[from] ContactIdError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] ContactNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneNumberError),

    #[error("Address too long: maximum {max} characters, got {actual}")]
    InvalidAddress { max: usize, actual: usize },

    #[error("Contact not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for ContactError {
    fn from(err: anyhow::Error) -> Self {
        ContactError::Unknown(err.to_string())
    }
}
