pub mod auth;
pub mod results;
