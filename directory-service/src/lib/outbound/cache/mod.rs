pub mod memory;
pub mod redis;

pub use self::memory::MokaCacheStore;
pub use self::redis::RedisCacheStore;
