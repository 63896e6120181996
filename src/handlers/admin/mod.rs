pub mod database_handler;
pub mod user_handler;
