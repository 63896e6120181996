pub mod dashboard_handler;
pub mod team_handler;
pub mod player_handler;
pub mod match_handler;
pub mod stats_handler;
