use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Derives keys with PBKDF2-HMAC-SHA256 and stores `base64(salt || key)`.
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    /// Size of the random salt in bytes.
    pub const SALT_SIZE: usize = 16;

    /// Size of the derived key in bytes.
    pub const KEY_SIZE: usize = 32;

    /// Number of PBKDF2 rounds.
    ///
    /// Stored hashes do not carry the iteration count, so changing this value
    /// invalidates every existing hash.
    pub const ITERATIONS: u32 = 10_000;

    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            iterations: Self::ITERATIONS,
        }
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses a fresh random salt on every call, so hashing the same password
    /// twice yields two different encodings.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Base64 encoding of the salt followed by the derived key
    ///
    /// # Errors
    /// * `EmptyPassword` - Password is empty
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::EmptyPassword);
        }

        let mut salt = [0u8; Self::SALT_SIZE];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        let key = self.derive(password, &salt);

        let mut encoded = Vec::with_capacity(Self::SALT_SIZE + Self::KEY_SIZE);
        encoded.extend_from_slice(&salt);
        encoded.extend_from_slice(&key);

        Ok(STANDARD.encode(encoded))
    }

    /// Verify a password against a stored hash.
    ///
    /// The derived key is compared in constant time. Malformed hashes never
    /// match.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `encoded_hash` - Value previously returned by [`PasswordHasher::hash`]
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, encoded_hash: &str) -> bool {
        let Ok(decoded) = STANDARD.decode(encoded_hash) else {
            return false;
        };

        if decoded.len() != Self::SALT_SIZE + Self::KEY_SIZE {
            return false;
        }

        let (salt, stored_key) = decoded.split_at(Self::SALT_SIZE);
        let computed_key = self.derive(password, salt);

        computed_key.as_slice().ct_eq(stored_key).into()
    }

    fn derive(&self, password: &str, salt: &[u8]) -> [u8; Self::KEY_SIZE] {
        let mut key = [0u8; Self::KEY_SIZE];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("SecurePass123!").unwrap();
        let second = hasher.hash("SecurePass123!").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("SecurePass123!", &first));
        assert!(hasher.verify("SecurePass123!", &second));
    }

    #[test]
    fn test_encoded_layout() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("password").unwrap();

        let decoded = STANDARD.decode(&hash).unwrap();
        assert_eq!(
            decoded.len(),
            PasswordHasher::SALT_SIZE + PasswordHasher::KEY_SIZE
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_empty_password_rejected() {
        let hasher = PasswordHasher::new();
        assert_eq!(hasher.hash(""), Err(PasswordError::EmptyPassword));
    }

    #[test]
    fn test_verify_malformed_hash() {
        let hasher = PasswordHasher::new();

        assert!(!hasher.verify("password", "invalid_hash"));
        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("password", "%%%not-base64%%%"));
        // Valid base64, wrong length
        assert!(!hasher.verify("password", &STANDARD.encode([7u8; 20])));
    }

    #[test]
    fn test_verify_truncated_hash() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("password").unwrap();
        let mut decoded = STANDARD.decode(&hash).unwrap();
        decoded.pop();

        assert!(!hasher.verify("password", &STANDARD.encode(decoded)));
    }
}
