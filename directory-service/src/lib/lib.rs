pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::contact;
pub use domain::credential;
pub use outbound::repositories;
