use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::match_day::clock::SubstitutionCountdown;
use crate::match_day::rotation::{LivePlayerMinutes, Recommendation};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct MatchSession {
    pub id: Uuid,
    pub match_id: Uuid,
    pub name: String,
    pub periods: i32,
    pub period_length: i32,
    pub substitution_interval: i32,
    pub is_active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub current_period: i32,
    /// Seconds banked by earlier runs of the clock
    pub elapsed_time: i64,
    pub last_substitution: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session list row with the match it tracks.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct SessionSummary {
    pub id: Uuid,
    pub match_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub current_period: i32,
    pub periods: i32,
    pub team_name: String,
    pub opponent_name: String,
    pub match_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub upcoming: Vec<SessionSummary>,
    pub past: Vec<SessionSummary>,
}

/// Sessions created in the last fortnight stay listed as upcoming.
const RECENT_SESSION_DAYS: i64 = 14;

impl SessionList {
    /// A session is upcoming while its match lies ahead or it was created recently.
    pub fn split(rows: Vec<SessionSummary>, now: DateTime<Utc>) -> Self {
        let recent = now - chrono::Duration::days(RECENT_SESSION_DAYS);
        let (upcoming, past) = rows
            .into_iter()
            .partition(|s| s.match_date >= now || s.created_at >= recent);
        Self { upcoming, past }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PlayingTime {
    pub id: Uuid,
    pub match_session_id: Uuid,
    pub player_id: Uuid,
    pub minutes_played: i32,
    pub is_on_pitch: bool,
    pub last_substitution_time: Option<DateTime<Utc>>,
}

/// Playing time joined with the player's name.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct SquadMember {
    pub id: Uuid,
    pub player_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub minutes_played: i32,
    pub is_on_pitch: bool,
    pub last_substitution_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PlayerSubstitution {
    pub id: Uuid,
    pub match_session_id: Uuid,
    pub player_in_id: Uuid,
    pub player_out_id: Uuid,
    pub minute: i32,
    pub period: i32,
    pub substituted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: MatchSession,
    pub players_on_pitch: Vec<SquadMember>,
    pub players_on_bench: Vec<SquadMember>,
    pub substitutions: Vec<PlayerSubstitution>,
    pub current_game_time: Option<i64>,
}

/// Clock snapshot for the pitch-side view.
#[derive(Debug, Serialize)]
pub struct PitchView {
    pub session_id: Uuid,
    pub is_active: bool,
    pub current_period: i32,
    pub total_periods: i32,
    pub period_length: i32,
    pub substitution_interval: i32,
    pub current_game_time: Option<i64>,
    pub minutes_remaining: Option<i64>,
    pub next_sub_countdown: Option<SubstitutionCountdown>,
    pub elapsed_minutes_previous_periods: i64,
    pub elapsed_seconds_previous_periods: i64,
    pub on_pitch: Vec<SquadMember>,
    pub on_bench: Vec<SquadMember>,
}

#[derive(Debug, Serialize)]
pub struct MatchInfo {
    pub period: i32,
    pub total_periods: i32,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub players_on_pitch: Vec<LivePlayerMinutes>,
    pub players_on_bench: Vec<LivePlayerMinutes>,
    pub match_info: MatchInfo,
}

#[derive(Debug, Serialize)]
pub struct PlayingTimesResponse {
    pub playing_times: Vec<LivePlayerMinutes>,
    pub elapsed: i64,
    pub period: i32,
    pub total_periods: i32,
    pub minute_in_match: i64,
    pub minute_in_period: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub next_sub_countdown: Option<SubstitutionCountdown>,
    pub substitution_interval: i32,
    pub elapsed_seconds_previous_periods: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub match_id: Uuid,
    pub name: Option<String>,
    #[serde(default = "default_periods")]
    pub periods: i32,
    #[serde(default = "default_period_length")]
    pub period_length: i32,
    #[serde(default = "default_substitution_interval")]
    pub substitution_interval: i32,
}

fn default_periods() -> i32 {
    2
}

fn default_period_length() -> i32 {
    25
}

fn default_substitution_interval() -> i32 {
    5
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_session_config(&self.name, self.periods, self.period_length, self.substitution_interval)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub name: Option<String>,
    pub periods: i32,
    pub period_length: i32,
    pub substitution_interval: i32,
}

impl UpdateSessionRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_session_config(&self.name, self.periods, self.period_length, self.substitution_interval)
    }
}

fn validate_session_config(
    name: &Option<String>,
    periods: i32,
    period_length: i32,
    substitution_interval: i32,
) -> Result<(), String> {
    if let Some(name) = name {
        if name.chars().count() > 100 {
            return Err("Session name must be at most 100 characters".into());
        }
    }
    if !(1..=10).contains(&periods) {
        return Err("Periods must be between 1 and 10".into());
    }
    if !(1..=90).contains(&period_length) {
        return Err("Period length must be between 1 and 90 minutes".into());
    }
    if !(0..=90).contains(&substitution_interval) {
        return Err("Substitution interval must be between 0 and 90 minutes".into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SessionPlayersRequest {
    pub player_ids: Vec<Uuid>,
    #[serde(default)]
    pub starter_ids: Vec<Uuid>,
}

impl SessionPlayersRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(missing) = self.starter_ids.iter().find(|id| !self.player_ids.contains(id)) {
            return Err(format!("Starter {} is not part of the selected squad", missing));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SubstitutionRequest {
    pub player_in_id: Uuid,
    pub player_out_id: Uuid,
    pub minute: Option<i32>,
    pub period: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct QuickSubRequest {
    pub player_in: Uuid,
    pub player_out: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubstitutionResult {
    pub substitution_id: Uuid,
    pub minute: i32,
    pub period: i32,
    pub player_in_id: Uuid,
    pub player_out_id: Uuid,
    pub player_in: String,
    pub player_out: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPeriodRequest {
    pub period: i32,
}
