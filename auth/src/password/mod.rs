pub mod errors;
pub mod pbkdf2;

pub use self::errors::PasswordError;
pub use self::pbkdf2::PasswordHasher;
