pub mod errors;
pub mod ports;

pub use errors::CacheError;
pub use ports::CacheStore;
