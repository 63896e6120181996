pub mod clip_handler;
pub mod media_handler;
pub mod reel_handler;
