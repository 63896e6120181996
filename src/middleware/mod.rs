pub mod auth;
pub mod admin;
