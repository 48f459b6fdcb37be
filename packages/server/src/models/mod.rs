pub mod auth;
pub mod result;
pub mod user;
