use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lineup::{Formation, PositionCounts, PositionType};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct FormationTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub player_count: i32,
    pub formation_structure: String,
    pub created_at: DateTime<Utc>,
}

/// A formation with its goalkeeper/defence/midfield/attack breakdown.
#[derive(Debug, Serialize)]
pub struct FormationView {
    #[serde(flatten)]
    pub formation: FormationTemplate,
    pub position_counts: PositionCounts,
}

impl From<FormationTemplate> for FormationView {
    fn from(formation: FormationTemplate) -> Self {
        let parsed = Formation::parse(&formation.formation_structure).ok();
        let position_counts = PositionCounts::from_formation(parsed.as_ref());
        Self { formation, position_counts }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormationRequest {
    pub name: String,
    pub description: Option<String>,
    pub player_count: i32,
    pub formation_structure: String,
}

impl FormationRequest {
    pub fn validate(&self) -> Result<Formation, String> {
        if self.name.trim().is_empty() || self.name.chars().count() > 50 {
            return Err("Formation name must be between 1 and 50 characters".into());
        }
        let formation = Formation::parse(&self.formation_structure).map_err(|e| e.to_string())?;
        formation.validate_for(self.player_count).map_err(|e| e.to_string())?;
        Ok(formation)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct LineupPosition {
    pub id: Uuid,
    pub name: String,
    pub short_name: String,
    pub position_type: String,
}

#[derive(Debug, Deserialize)]
pub struct LineupPositionRequest {
    pub name: String,
    pub short_name: String,
    pub position_type: PositionType,
}

impl LineupPositionRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.name.chars().count() > 50 {
            return Err("Position name must be between 1 and 50 characters".into());
        }
        if self.short_name.trim().is_empty() || self.short_name.chars().count() > 5 {
            return Err("Short name must be between 1 and 5 characters".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PitchDirection {
    FirstPeriod,
    SecondPeriod,
}

impl PitchDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PitchDirection::FirstPeriod => "first_period",
            PitchDirection::SecondPeriod => "second_period",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Lineup {
    pub id: Uuid,
    pub name: String,
    pub match_id: Option<Uuid>,
    pub team_id: Uuid,
    pub formation_id: Option<Uuid>,
    pub is_template: bool,
    pub direction: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A player placed on a lineup, with name and position details joined in.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct LineupSlot {
    pub id: Uuid,
    pub player_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub position_id: Option<Uuid>,
    pub position_short_name: Option<String>,
    pub position_type: Option<String>,
    pub x_coordinate: f64,
    pub y_coordinate: f64,
    pub jersey_number: Option<i32>,
    pub is_starter: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LineupDetail {
    #[serde(flatten)]
    pub lineup: Lineup,
    pub formation: Option<FormationTemplate>,
    pub starters: Vec<LineupSlot>,
    pub substitutes: Vec<LineupSlot>,
}

#[derive(Debug, Deserialize)]
pub struct LineupQuery {
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLineupRequest {
    pub name: String,
    pub team_id: Uuid,
    pub match_id: Option<Uuid>,
    pub formation_id: Option<Uuid>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default = "default_direction")]
    pub direction: PitchDirection,
    pub notes: Option<String>,
    /// Copy player placements from this template lineup.
    pub template_id: Option<Uuid>,
}

fn default_direction() -> PitchDirection {
    PitchDirection::FirstPeriod
}

impl CreateLineupRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_lineup_name(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineupRequest {
    pub name: String,
    pub match_id: Option<Uuid>,
    pub formation_id: Option<Uuid>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default = "default_direction")]
    pub direction: PitchDirection,
    pub notes: Option<String>,
}

impl UpdateLineupRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_lineup_name(&self.name)
    }
}

fn validate_lineup_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() || name.chars().count() > 100 {
        return Err("Lineup name must be between 1 and 100 characters".into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SavePositionsRequest {
    #[serde(default)]
    pub positions: Vec<PositionPayload>,
    pub direction: Option<PitchDirection>,
}

#[derive(Debug, Deserialize)]
pub struct PositionPayload {
    pub player_id: Uuid,
    pub position_id: Option<Uuid>,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_is_starter")]
    pub is_starter: bool,
    pub jersey_number: Option<i32>,
    pub notes: Option<String>,
}

fn default_is_starter() -> bool {
    true
}
