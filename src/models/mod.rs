pub mod common;
pub mod user;
pub mod auth;
pub mod team;
pub mod player;
pub mod football_match;
pub mod appearance;
pub mod match_session;
pub mod lineup;
pub mod video;
pub mod stats;
