use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type. Uses HS256 (HMAC with SHA-256) and checks
/// the signature, issuer and audience on decode. Expiry is left to the caller
/// so it can be evaluated against an injected clock.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
}

impl JwtHandler {
    /// Create a new JWT handler.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `issuer` - Value written to and required in the `iss` claim
    /// * `audience` - Value written to and required in the `aud` claim
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    pub fn new(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode a JWT token and verify signature, issuer and audience.
    ///
    /// # Arguments
    /// * `token` - JWT token string to decode
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `InvalidSignature` - Signed with another key
    /// * `InvalidIssuer` / `InvalidAudience` - Issued for another party
    /// * `DecodingFailed` - Token is malformed or misses required claims
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let token_data =
            decode::<T>(token, &self.decoding_key, &self.validation()).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                    ErrorKind::InvalidAudience => JwtError::InvalidAudience,
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::DecodingFailed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation
    }
}
