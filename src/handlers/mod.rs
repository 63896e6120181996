pub mod admin;
pub mod auth_handler;
pub mod backend_health_handler;
pub mod club;
pub mod lineup;
pub mod registration_handler;
pub mod session;
pub mod video;
