pub mod helpers;
pub mod user_queries;
pub mod team_queries;
pub mod player_queries;
pub mod match_queries;
pub mod session_queries;
pub mod lineup_queries;
pub mod video_queries;
pub mod stats_queries;
