use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::credential::errors::EmailError;
use crate::credential::errors::FullNameError;
use crate::credential::errors::UserIdError;

/// Registered account.
///
/// The password hash is mutated in place on reset; accounts are never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name of a user, 1-100 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    const MAX_LENGTH: usize = 100;

    /// Create a validated full name.
    ///
    /// # Errors
    /// * `Empty` - Name is blank
    /// * `TooLong` - Name exceeds 100 characters
    pub fn new(full_name: String) -> Result<Self, FullNameError> {
        let trimmed = full_name.trim();
        let length = trimmed.chars().count();

        if length == 0 {
            Err(FullNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. The address is
/// kept exactly as given, so lookups are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MAX_LENGTH: usize = 255;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    /// * `TooLong` - Email exceeds 255 characters
    pub fn new(email: String) -> Result<Self, EmailError> {
        if email.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
                actual: email.len(),
            });
        }

        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `full_name` - Validated display name
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    pub fn new(full_name: FullName, email: EmailAddress, password: String) -> Self {
        Self {
            full_name,
            email,
            password,
        }
    }
}

/// Login attempt.
///
/// The email is left unvalidated: a malformed address simply matches no account.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trimmed() {
        let name = FullName::new("  Alice Smith ".to_string()).unwrap();
        assert_eq!(name.as_str(), "Alice Smith");
    }

    #[test]
    fn test_full_name_blank_rejected() {
        assert_eq!(FullName::new("   ".to_string()), Err(FullNameError::Empty));
    }

    #[test]
    fn test_full_name_too_long() {
        let result = FullName::new("a".repeat(101));
        assert_eq!(
            result,
            Err(FullNameError::TooLong {
                max: 100,
                actual: 101
            })
        );
    }

    #[test]
    fn test_email_keeps_case() {
        let email = EmailAddress::new("Alice@Example.com".to_string()).unwrap();
        assert_eq!(email.as_str(), "Alice@Example.com");
    }

    #[test]
    fn test_email_invalid() {
        assert!(matches!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_user_id_round_trip() {
        let id = UserId::new();
        assert_eq!(UserId::from_string(&id.to_string()), Ok(id));
        assert!(UserId::from_string("nope").is_err());
    }
}
