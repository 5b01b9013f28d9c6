use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::contact::errors::ContactError;
use crate::contact::errors::ContactIdError;
use crate::contact::errors::ContactNameError;
use crate::contact::errors::PhoneNumberError;
use crate::credential::models::EmailAddress;
use crate::credential::models::UserId;

/// Contact record kept by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub owner_id: UserId,
    pub name: ContactName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

/// Contact unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactId(pub Uuid);

impl ContactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a contact ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, ContactIdError> {
        Uuid::parse_str(s)
            .map(ContactId)
            .map_err(|e| ContactIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Contact display name, 1-100 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactName(String);

impl ContactName {
    const MAX_LENGTH: usize = 100;

    /// Create a validated contact name.
    ///
    /// # Errors
    /// * `Empty` - Name is blank
    /// * `TooLong` - Name exceeds 100 characters
    pub fn new(name: String) -> Result<Self, ContactNameError> {
        let trimmed = name.trim();
        let length = trimmed.chars().count();

        if length == 0 {
            Err(ContactNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(ContactNameError::TooLong {
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

impl fmt::Display for ContactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Phone number value type
///
/// Free-form as typed by the user, restricted to digits and common
/// separators with 7-15 digits in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 7;
    const MAX_DIGITS: usize = 15;

    /// Create a validated phone number.
    ///
    /// # Errors
    /// * `InvalidCharacters` - Contains anything but digits, spaces, `+`, `-`, `(` and `)`
    /// * `DigitCount` - Fewer than 7 or more than 15 digits
    pub fn new(phone: String) -> Result<Self, PhoneNumberError> {
        let phone = phone.trim().to_string();

        if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
        {
            return Err(PhoneNumberError::InvalidCharacters);
        }

        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(PhoneNumberError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                actual: digits,
            });
        }

        Ok(Self(phone))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Postal address, at most 255 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    const MAX_LENGTH: usize = 255;

    /// Create an address; blank input means no address.
    ///
    /// # Errors
    /// * `InvalidAddress` - Address exceeds 255 characters
    pub fn new(address: Option<String>) -> Result<Option<Self>, ContactError> {
        let Some(address) = address else {
            return Ok(None);
        };

        let trimmed = address.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            Ok(None)
        } else if length > Self::MAX_LENGTH {
            Err(ContactError::InvalidAddress {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Some(Self(trimmed.to_string())))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated contact fields, used both to create and to replace a contact.
#[derive(Debug, Clone)]
pub struct ContactDetails {
    pub name: ContactName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub address: Option<Address>,
}

impl ContactDetails {
    /// Validate raw contact fields.
    ///
    /// # Errors
    /// * `InvalidName` / `InvalidEmail` / `InvalidPhone` / `InvalidAddress` - Field fails validation
    pub fn parse(
        name: String,
        email: String,
        phone: String,
        address: Option<String>,
    ) -> Result<Self, ContactError> {
        Ok(Self {
            name: ContactName::new(name)?,
            email: EmailAddress::new(email)?,
            phone: PhoneNumber::new(phone)?,
            address: Address::new(address)?,
        })
    }
}
