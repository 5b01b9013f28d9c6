pub mod contact;
pub mod memory;
pub mod user;

pub use contact::PostgresContactRepository;
pub use memory::InMemoryContactRepository;
pub use memory::InMemoryUserRepository;
pub use user::PostgresUserRepository;
