use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// What a token may be used for.
///
/// Carried inside every token so an access token can never be replayed as a
/// reset token and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    PasswordReset,
}

/// Registered claims shared by every token kind.
pub trait RegisteredClaims {
    fn purpose(&self) -> TokenPurpose;

    /// Expiration time (Unix timestamp).
    fn expires_at(&self) -> i64;

    /// Check if token is expired.
    ///
    /// A token stays valid up to and including its `exp` second.
    fn is_expired(&self, current_timestamp: i64) -> bool {
        self.expires_at() < current_timestamp
    }
}

/// Claims of an access token issued on login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub purpose: TokenPurpose,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl AccessClaims {
    /// Create claims for an authenticated user.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `email` - Email the user logged in with
    /// * `name` - Display name
    /// * `issued_at` - Issue time
    /// * `ttl` - Lifetime of the token
    ///
    /// # Returns
    /// Claims with empty issuer and audience; set them with the builder methods
    pub fn for_user(
        user_id: impl ToString,
        email: impl Into<String>,
        name: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            name: name.into(),
            purpose: TokenPurpose::Access,
            iss: String::new(),
            aud: String::new(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = iss.into();
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = aud.into();
        self
    }
}

impl RegisteredClaims for AccessClaims {
    fn purpose(&self) -> TokenPurpose {
        self.purpose
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Claims of a password-reset token.
///
/// Carries nothing but the email the reset was requested for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetClaims {
    pub email: String,
    pub purpose: TokenPurpose,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl ResetClaims {
    pub fn for_email(email: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email: email.into(),
            purpose: TokenPurpose::PasswordReset,
            iss: String::new(),
            aud: String::new(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = iss.into();
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = aud.into();
        self
    }
}

impl RegisteredClaims for ResetClaims {
    fn purpose(&self) -> TokenPurpose {
        self.purpose
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_for_user() {
        let claims = AccessClaims::for_user(
            "user123",
            "alice@example.com",
            "Alice",
            issued_at(),
            Duration::hours(24),
        );

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_builder_pattern() {
        let claims = ResetClaims::for_email("bob@example.com", issued_at(), Duration::minutes(15))
            .with_issuer("directory")
            .with_audience("directory-clients");

        assert_eq!(claims.iss, "directory");
        assert_eq!(claims.aud, "directory-clients");
        assert_eq!(claims.purpose, TokenPurpose::PasswordReset);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_unique_token_ids() {
        let first = ResetClaims::for_email("bob@example.com", issued_at(), Duration::minutes(15));
        let second = ResetClaims::for_email("bob@example.com", issued_at(), Duration::minutes(15));

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_is_expired() {
        let claims = ResetClaims {
            exp: 1000,
            ..ResetClaims::for_email("bob@example.com", issued_at(), Duration::minutes(1))
        };

        assert!(!claims.is_expired(999)); // Not expired
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001)); // Expired
    }

    #[test]
    fn test_purpose_serialization() {
        let json = serde_json::to_string(&TokenPurpose::PasswordReset).unwrap();
        assert_eq!(json, "\"password_reset\"");
    }
}
