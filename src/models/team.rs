use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::football_match::Match;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    pub name: String,
    pub description: Option<String>,
}

impl TeamRequest {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Team name is required".into());
        }
        if name.chars().count() > 100 {
            return Err("Team name must be at most 100 characters".into());
        }
        Ok(())
    }
}
