use std::sync::Arc;

use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::AccessIdentity;
use crate::token::TokenError;
use crate::token::TokenIssuer;

/// Authentication coordinator combining password verification and token issuing.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `tokens` - Issuer shared with the components validating tokens
    pub fn new(tokens: Arc<TokenIssuer>) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            tokens,
        }
    }

    /// Token issuer used by this authenticator.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Password is empty or hashing failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `identity` - Identity to embed in the token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        identity: &AccessIdentity,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access_token(identity)?;

        Ok(AuthenticationResult { access_token })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::clock::DefaultClock;
    use crate::token::TokenSettings;

    fn authenticator() -> Authenticator {
        let tokens = TokenIssuer::new(
            TokenSettings {
                secret: "test_secret_key_at_least_32_bytes!".to_string(),
                issuer: "directory".to_string(),
                audience: "directory-clients".to_string(),
                access_ttl: Duration::minutes(60),
                reset_ttl: Duration::minutes(15),
            },
            Arc::new(DefaultClock),
        )
        .unwrap();

        Authenticator::new(Arc::new(tokens))
    }

    fn identity() -> AccessIdentity {
        AccessIdentity {
            user_id: "user123".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, &identity())
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());

        let decoded = authenticator
            .tokens()
            .validate_access_token(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded.sub, "user123");
        assert_eq!(decoded.email, "alice@example.com");
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, &identity());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_against_corrupt_hash() {
        let authenticator = authenticator();

        let result = authenticator.authenticate("my_password", "corrupt", &identity());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }
}
