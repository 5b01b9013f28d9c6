use async_trait::async_trait;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::LoginCommand;
use crate::domain::credential::models::LoginOutcome;
use crate::domain::credential::models::RegisterCommand;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;

/// Port for credential lifecycle operations.
#[async_trait]
pub trait CredentialServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated full name, email and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `EmptyPassword` - Password is empty
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<User, CredentialError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, CredentialError>;

    /// Mail a password-reset link to a registered address.
    ///
    /// # Errors
    /// * `NotFound` - No account uses this email
    /// * `DatabaseError` - Database operation failed
    async fn forgot_password(&self, email: &str) -> Result<(), CredentialError>;

    /// Replace the password of the account a reset token was issued for.
    ///
    /// # Arguments
    /// * `token` - Reset token, possibly still URL-encoded
    /// * `new_password` - New plaintext password
    ///
    /// # Errors
    /// * `InvalidResetToken` - Token is invalid, expired, already used, or its account is gone
    /// * `EmptyPassword` - New password is empty
    /// * `Unavailable` - Used-token ledger could not be consulted
    /// * `DatabaseError` - Database operation failed
    async fn reset_password(&self, token: &str, new_password: &str)
        -> Result<(), CredentialError>;
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, CredentialError>;

    /// Retrieve user by email address, compared exactly.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError>;

    /// Replace the stored password hash.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), CredentialError>;
}
