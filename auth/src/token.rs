use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use thiserror::Error;

use crate::clock::Clock;
use crate::jwt::AccessClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::RegisteredClaims;
use crate::jwt::ResetClaims;
use crate::jwt::TokenPurpose;

/// Minimum length of an HS256 signing secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signing configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub reset_ttl: Duration,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token signing secret is {len} bytes, at least {MIN_SECRET_LEN} are required")]
    WeakSecret { len: usize },

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

/// Identity embedded into an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

/// A freshly signed reset token.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates access and password-reset tokens.
///
/// All expiry decisions go through the injected [`Clock`].
pub struct TokenIssuer {
    jwt: JwtHandler,
    access_ttl: Duration,
    reset_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create a token issuer.
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty
    /// * `WeakSecret` - Secret is shorter than [`MIN_SECRET_LEN`] bytes
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        let secret = settings.secret.as_bytes();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret { len: secret.len() });
        }

        Ok(Self {
            jwt: JwtHandler::new(secret, settings.issuer, settings.audience),
            access_ttl: settings.access_ttl,
            reset_ttl: settings.reset_ttl,
            clock,
        })
    }

    /// Current time as seen by the issuer.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Sign an access token for a logged-in user.
    pub fn issue_access_token(&self, identity: &AccessIdentity) -> Result<String, TokenError> {
        let claims = AccessClaims::for_user(
            &identity.user_id,
            identity.email.clone(),
            identity.name.clone(),
            self.clock.utc(),
            self.access_ttl,
        )
        .with_issuer(self.jwt.issuer())
        .with_audience(self.jwt.audience());

        Ok(self.jwt.encode(&claims)?)
    }

    /// Sign a single-purpose password-reset token for `email`.
    pub fn issue_reset_token(&self, email: &str) -> Result<IssuedResetToken, TokenError> {
        let issued_at = self.clock.utc();
        let claims = ResetClaims::for_email(email, issued_at, self.reset_ttl)
            .with_issuer(self.jwt.issuer())
            .with_audience(self.jwt.audience());

        let token = self.jwt.encode(&claims)?;

        Ok(IssuedResetToken {
            token,
            token_id: claims.jti,
            expires_at: issued_at + self.reset_ttl,
        })
    }

    /// Validate a reset token as received in a reset link or form.
    ///
    /// The raw value may still be URL-encoded. Returns `None` for anything
    /// that is not a live, correctly signed reset token.
    pub fn validate_reset_token(&self, raw: &str) -> Option<ResetClaims> {
        let decoded = percent_decode_str(raw).decode_utf8().ok()?;
        self.decode_live(&decoded, TokenPurpose::PasswordReset).ok()
    }

    /// Validate a bearer access token.
    ///
    /// # Errors
    /// * `Jwt` - Token is malformed, forged, expired or not an access token
    pub fn validate_access_token(&self, raw: &str) -> Result<AccessClaims, TokenError> {
        Ok(self.decode_live(raw, TokenPurpose::Access)?)
    }

    fn decode_live<T>(&self, token: &str, purpose: TokenPurpose) -> Result<T, JwtError>
    where
        T: RegisteredClaims + for<'de> Deserialize<'de>,
    {
        let claims: T = self.jwt.decode(token)?;

        if claims.purpose() != purpose {
            return Err(JwtError::WrongPurpose);
        }
        if claims.is_expired(self.clock.utc().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}
