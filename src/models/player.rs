use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::appearance::PlayerAppearance;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Player {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }
}

/// "first last", or just the first name when there is no last name.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    if last_name.trim().is_empty() {
        first_name.to_string()
    } else {
        format!("{} {}", first_name, last_name)
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub player: Player,
    pub display_name: String,
    pub appearances: Vec<PlayerAppearance>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub position: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PlayerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() {
            return Err("First name is required".into());
        }
        if self.first_name.chars().count() > 100 || self.last_name.chars().count() > 100 {
            return Err("Names must be at most 100 characters".into());
        }
        if let Some(email) = &self.email {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err("Invalid email address".into());
            }
        }
        if let Some(phone) = &self.phone {
            if phone.chars().count() > 20 {
                return Err("Phone number must be at most 20 characters".into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub active: Option<bool>,
}
