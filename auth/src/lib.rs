//! Authentication utilities library
//!
//! Provides the credential primitives used by the directory service:
//! - Password hashing (PBKDF2-HMAC-SHA256, salted)
//! - Access and password-reset tokens (HS256 JWT with typed claims)
//! - An injectable `mockable` clock for expiry decisions
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Reset Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{DefaultClock, TokenIssuer, TokenSettings};
//!
//! let issuer = TokenIssuer::new(
//!     TokenSettings {
//!         secret: "secret_key_at_least_32_bytes_long!".to_string(),
//!         issuer: "directory".to_string(),
//!         audience: "directory-clients".to_string(),
//!         access_ttl: chrono::Duration::minutes(60),
//!         reset_ttl: chrono::Duration::minutes(15),
//!     },
//!     Arc::new(DefaultClock),
//! )
//! .unwrap();
//!
//! let issued = issuer.issue_reset_token("alice@example.com").unwrap();
//! let claims = issuer.validate_reset_token(&issued.token).unwrap();
//! assert_eq!(claims.email, "alice@example.com");
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use clock::Clock;
pub use clock::DefaultClock;
pub use clock::ManualClock;
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::ResetClaims;
pub use jwt::TokenPurpose;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::AccessIdentity;
pub use token::IssuedResetToken;
pub use token::TokenError;
pub use token::TokenIssuer;
pub use token::TokenSettings;
