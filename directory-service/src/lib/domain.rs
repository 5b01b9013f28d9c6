pub mod cache;
pub mod contact;
pub mod credential;
pub mod events;
pub mod notification;
