pub mod api;
pub mod auth;
pub mod events;
pub mod signature;
