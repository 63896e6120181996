pub mod lineup_handler;
pub mod formation_handler;
pub mod position_handler;
