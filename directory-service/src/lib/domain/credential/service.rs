use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AccessIdentity;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::ResetClaims;
use url::Url;

use crate::domain::cache::CacheStore;
use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::LoginCommand;
use crate::domain::credential::models::LoginOutcome;
use crate::domain::credential::models::RegisterCommand;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;
use crate::domain::credential::ports::CredentialServicePort;
use crate::domain::credential::ports::UserRepository;
use crate::domain::events::models::DirectoryEvent;
use crate::domain::events::ports::EventPublisher;
use crate::domain::notification::ports::EmailSender;

pub const RESET_EMAIL_SUBJECT: &str = "Reset Your Password";

/// Cache key prefix of the consumed reset-token ledger.
pub const CONSUMED_RESET_TOKEN_PREFIX: &str = "reset-token:consumed:";

#[derive(Debug, Clone)]
pub struct CredentialSettings {
    /// Reset link the token is appended to as `?token=`
    pub reset_link_base: Url,
    /// Routing key of published directory events
    pub routing_key: String,
}

/// Domain service implementation for credential operations.
///
/// Registration and reset mails are best-effort: their failures are logged
/// and never fail the primary operation.
pub struct CredentialService<UR, EP, CS, ES>
where
    UR: UserRepository + ?Sized,
    EP: EventPublisher + ?Sized,
    CS: CacheStore + ?Sized,
    ES: EmailSender + ?Sized,
{
    repository: Arc<UR>,
    event_publisher: Arc<EP>,
    cache: Arc<CS>,
    mailer: Arc<ES>,
    authenticator: Arc<Authenticator>,
    settings: CredentialSettings,
}

impl<UR, EP, CS, ES> CredentialService<UR, EP, CS, ES>
where
    UR: UserRepository + ?Sized,
    EP: EventPublisher + ?Sized,
    CS: CacheStore + ?Sized,
    ES: EmailSender + ?Sized,
{
    /// Create a new credential service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `event_publisher` - Directory event publishing implementation
    /// * `cache` - Backend of the consumed reset-token ledger
    /// * `mailer` - Outgoing mail for reset links
    /// * `authenticator` - Password hashing and token issuing
    /// * `settings` - Reset link base and event routing key
    pub fn new(
        repository: Arc<UR>,
        event_publisher: Arc<EP>,
        cache: Arc<CS>,
        mailer: Arc<ES>,
        authenticator: Arc<Authenticator>,
        settings: CredentialSettings,
    ) -> Self {
        Self {
            repository,
            event_publisher,
            cache,
            mailer,
            authenticator,
            settings,
        }
    }

    fn reset_link(&self, token: &str) -> String {
        let mut link = self.settings.reset_link_base.clone();
        link.query_pairs_mut().append_pair("token", token);
        link.to_string()
    }

    async fn publish(&self, event: DirectoryEvent) {
        let payload = event.to_string();
        if let Err(e) = self
            .event_publisher
            .publish(payload.as_bytes(), &self.settings.routing_key)
            .await
        {
            tracing::error!(error = %e, event = %payload, "Failed to publish directory event");
        }
    }

    /// Record the token id as used. Fails closed when the ledger is unreachable.
    async fn consume_reset_token(&self, claims: &ResetClaims) -> Result<(), CredentialError> {
        let now = self.authenticator.tokens().now().timestamp();
        // Token stays valid through its `exp` second
        let remaining = (claims.exp - now + 1).max(1) as u64;
        let key = format!("{}{}", CONSUMED_RESET_TOKEN_PREFIX, claims.jti);

        match self
            .cache
            .set_if_absent(&key, b"1", Duration::from_secs(remaining))
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(token_id = %claims.jti, "Reset token replayed");
                Err(CredentialError::InvalidResetToken)
            }
            Err(e) => {
                tracing::error!(
                    token_id = %claims.jti,
                    error = %e,
                    "Reset token ledger unavailable"
                );
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl<UR, EP, CS, ES> CredentialServicePort for CredentialService<UR, EP, CS, ES>
where
    UR: UserRepository + ?Sized,
    EP: EventPublisher + ?Sized,
    CS: CacheStore + ?Sized,
    ES: EmailSender + ?Sized,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, CredentialError> {
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(CredentialError::AlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.authenticator.hash_password(&command.password)?;

        let user = User {
            id: UserId::new(),
            full_name: command.full_name,
            email: command.email,
            password_hash,
            created_at: self.authenticator.tokens().now(),
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        self.publish(DirectoryEvent::UserRegistered {
            email: created_user.email.as_str().to_string(),
        })
        .await;

        Ok(created_user)
    }

    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, CredentialError> {
        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(CredentialError::InvalidCredentials);
        };

        let identity = AccessIdentity {
            user_id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.full_name.as_str().to_string(),
        };

        let result = self
            .authenticator
            .authenticate(&command.password, &user.password_hash, &identity)
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
                    CredentialError::InvalidCredentials
                }
                AuthenticationError::PasswordError(err) => err.into(),
                AuthenticationError::TokenError(err) => {
                    CredentialError::Unknown(format!("Token generation failed: {}", err))
                }
            })?;

        Ok(LoginOutcome {
            user,
            access_token: result.access_token,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<(), CredentialError> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| CredentialError::NotFound(email.to_string()))?;

        let issued = self
            .authenticator
            .tokens()
            .issue_reset_token(user.email.as_str())
            .map_err(|e| CredentialError::Unknown(format!("Token generation failed: {}", e)))?;

        let body = format!(
            "Click the link to reset your password: {}",
            self.reset_link(&issued.token)
        );

        match self
            .mailer
            .send(user.email.as_str(), RESET_EMAIL_SUBJECT, &body)
            .await
        {
            Ok(()) => tracing::info!(
                user_id = %user.id,
                token_id = %issued.token_id,
                expires_at = %issued.expires_at,
                "Password reset link sent"
            ),
            Err(e) => tracing::error!(
                user_id = %user.id,
                token_id = %issued.token_id,
                error = %e,
                "Failed to send password reset link"
            ),
        }

        Ok(())
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let claims = self
            .authenticator
            .tokens()
            .validate_reset_token(token)
            .ok_or(CredentialError::InvalidResetToken)?;

        let user = self
            .repository
            .find_by_email(&claims.email)
            .await?
            .ok_or(CredentialError::InvalidResetToken)?;

        let password_hash = self.authenticator.hash_password(new_password)?;

        self.consume_reset_token(&claims).await?;

        self.repository
            .update_password(&user.id, &password_hash)
            .await
            .map_err(|e| match e {
                CredentialError::NotFound(_) => CredentialError::InvalidResetToken,
                other => other,
            })?;

        tracing::info!(user_id = %user.id, token_id = %claims.jti, "Password reset");

        Ok(())
    }
}
