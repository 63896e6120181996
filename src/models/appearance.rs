use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct MatchAppearance {
    pub id: Uuid,
    pub player_id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub minutes_played: Option<i32>,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_card: bool,
}

/// Appearance row with the player's name, as listed on a match.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct AppearanceWithPlayer {
    pub id: Uuid,
    pub player_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub team_id: Uuid,
    pub minutes_played: Option<i32>,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_card: bool,
}

/// Appearance row with match context, as listed on a player.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PlayerAppearance {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_name: String,
    pub opponent_name: String,
    pub match_date: DateTime<Utc>,
    pub minutes_played: Option<i32>,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_card: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppearanceStatsRequest {
    pub minutes_played: Option<i32>,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_card: bool,
}

impl AppearanceStatsRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(minutes) = self.minutes_played {
            if !(0..=120).contains(&minutes) {
                return Err("Minutes played must be between 0 and 120".into());
            }
        }
        if self.goals < 0 || self.assists < 0 {
            return Err("Goals and assists cannot be negative".into());
        }
        if !(0..=2).contains(&self.yellow_cards) {
            return Err("Yellow cards must be between 0 and 2".into());
        }
        Ok(())
    }
}
