use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::appearance::AppearanceWithPlayer;
use crate::models::common::MatchResult;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    Home,
    Away,
    Neutral,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Home" => Ok(LocationType::Home),
            "Away" => Ok(LocationType::Away),
            "Neutral" => Ok(LocationType::Neutral),
            other => Err(format!("Unknown location type '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Friendly,
    League,
    Cup,
    Tournament,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A fixture of one club team against a free-text opponent.
/// `team_name` is joined in from `teams`.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Match {
    pub id: Uuid,
    pub smoras_team_id: Uuid,
    pub team_name: String,
    pub opponent_name: String,
    pub location_type: String,
    pub smoras_score: Option<i32>,
    pub opponent_score: Option<i32>,
    pub match_date: DateTime<Utc>,
    pub location: Option<String>,
    pub match_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    fn is_away(&self) -> bool {
        self.location_type == "Away"
    }

    pub fn outcome(&self) -> Option<MatchResult> {
        match (self.smoras_score, self.opponent_score) {
            (Some(own), Some(opponent)) => Some(MatchResult::from_scores(own, opponent)),
            _ => None,
        }
    }

    pub fn result_text(&self) -> String {
        match self.outcome() {
            None => "Match not played yet".to_string(),
            Some(MatchResult::Win) => format!("{} won", self.team_name),
            Some(MatchResult::Loss) => format!("{} won", self.opponent_name),
            Some(MatchResult::Draw) => "Draw".to_string(),
        }
    }

    pub fn home_side(&self) -> &str {
        if self.is_away() { &self.opponent_name } else { &self.team_name }
    }

    pub fn away_side(&self) -> &str {
        if self.is_away() { &self.team_name } else { &self.opponent_name }
    }

    pub fn home_score(&self) -> Option<i32> {
        if self.is_away() { self.opponent_score } else { self.smoras_score }
    }

    pub fn away_score(&self) -> Option<i32> {
        if self.is_away() { self.smoras_score } else { self.opponent_score }
    }
}

/// Match plus the derived display fields clients render.
#[derive(Debug, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub fixture: Match,
    pub result_text: String,
    pub home_side: String,
    pub away_side: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl From<Match> for MatchView {
    fn from(fixture: Match) -> Self {
        Self {
            result_text: fixture.result_text(),
            home_side: fixture.home_side().to_string(),
            away_side: fixture.away_side().to_string(),
            home_score: fixture.home_score(),
            away_score: fixture.away_score(),
            fixture,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub view: MatchView,
    pub appearances: Vec<AppearanceWithPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub smoras_team_id: Uuid,
    pub opponent_name: String,
    #[serde(default = "default_location_type")]
    pub location_type: LocationType,
    pub match_date: DateTime<Utc>,
    pub location: Option<String>,
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,
    pub notes: Option<String>,
    pub smoras_score: Option<i32>,
    pub opponent_score: Option<i32>,
    /// Copy the appearance list of an earlier match of the same team.
    #[serde(default)]
    pub template_match_id: Option<Uuid>,
}

fn default_location_type() -> LocationType {
    LocationType::Home
}

fn default_match_type() -> MatchType {
    MatchType::Friendly
}

impl MatchRequest {
    pub fn validate(&self) -> Result<(), String> {
        let opponent = self.opponent_name.trim();
        if opponent.is_empty() {
            return Err("Opponent name is required".into());
        }
        if opponent.chars().count() > 100 {
            return Err("Opponent name must be at most 100 characters".into());
        }
        validate_scores(self.smoras_score, self.opponent_score)
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreUpdateRequest {
    pub smoras_score: Option<i32>,
    pub opponent_score: Option<i32>,
}

impl ScoreUpdateRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_scores(self.smoras_score, self.opponent_score)
    }
}

fn validate_scores(own: Option<i32>, opponent: Option<i32>) -> Result<(), String> {
    if own.map_or(false, |s| s < 0) || opponent.map_or(false, |s| s < 0) {
        return Err("Scores cannot be negative".into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct MatchPlayersRequest {
    pub team_id: Uuid,
    pub player_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(location: &str, own: Option<i32>, opponent: Option<i32>) -> Match {
        Match {
            id: Uuid::new_v4(),
            smoras_team_id: Uuid::new_v4(),
            team_name: "Smørås G12".into(),
            opponent_name: "Fana".into(),
            location_type: location.into(),
            smoras_score: own,
            opponent_score: opponent,
            match_date: Utc::now(),
            location: None,
            match_type: "League".into(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn result_text_follows_score() {
        assert_eq!(fixture("Home", None, Some(1)).result_text(), "Match not played yet");
        assert_eq!(fixture("Home", Some(3), Some(1)).result_text(), "Smørås G12 won");
        assert_eq!(fixture("Home", Some(0), Some(1)).result_text(), "Fana won");
        assert_eq!(fixture("Home", Some(2), Some(2)).result_text(), "Draw");
    }

    #[test]
    fn away_matches_swap_home_and_away() {
        let away = fixture("Away", Some(4), Some(2));
        assert_eq!(away.home_side(), "Fana");
        assert_eq!(away.away_side(), "Smørås G12");
        assert_eq!(away.home_score(), Some(2));
        assert_eq!(away.away_score(), Some(4));

        let neutral = fixture("Neutral", Some(4), Some(2));
        assert_eq!(neutral.home_side(), "Smørås G12");
        assert_eq!(neutral.home_score(), Some(4));
    }

    #[test]
    fn negative_scores_are_rejected() {
        let request = ScoreUpdateRequest { smoras_score: Some(-1), opponent_score: Some(0) };
        assert!(request.validate().is_err());
    }
}
