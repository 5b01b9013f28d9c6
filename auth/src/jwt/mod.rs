pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::AccessClaims;
pub use claims::RegisteredClaims;
pub use claims::ResetClaims;
pub use claims::TokenPurpose;
pub use errors::JwtError;
pub use handler::JwtHandler;
